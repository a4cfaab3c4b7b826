//! Column type inference and the typed table handed to the store.
//!
//! Uploaded CSVs carry no type information, yet the dashboard queries need to
//! know whether `popularity` is numeric or whether `explicit` is a flag. This
//! module owns:
//!
//! - [`ColumnType`], the four storage types the store understands
//! - [`TableSchema`], the ordered typed column list shared by the store and the
//!   query builders
//! - [`NormalizedTable`], a decoded upload with canonical headers and typed
//!   cells, ready to load
//!
//! Inference scans every row. Blank cells and common missing-value tokens
//! (`NA`, `null`, `NaN`, ...) are nulls and do not vote.

use std::fmt;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    columns,
    data::{Value, parse_typed_value},
    error::InsightError,
    loader::RawTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }

    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::String => "VARCHAR",
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "DOUBLE",
            ColumnType::Boolean => "BOOLEAN",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub datatype: ColumnType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnMeta>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(|column| column.datatype)
    }

    /// First column of `candidates` present in the table.
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|name| self.has_column(name))
    }

    /// SQL expression reading `name` as a number: the bare column when it is
    /// stored numerically, a `TRY_CAST` otherwise.
    pub fn numeric_expr(&self, name: &str) -> String {
        match self.column_type(name) {
            Some(ty) if ty.is_numeric() => quote_ident(name),
            _ => format!("TRY_CAST({} AS DOUBLE)", quote_ident(name)),
        }
    }

    pub fn set_column_type(&mut self, name: &str, datatype: ColumnType) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.datatype = datatype;
        }
    }

    pub fn create_table_sql(&self, table: &str) -> String {
        let definitions = self
            .columns
            .iter()
            .map(|column| format!("{} {}", quote_ident(&column.name), column.datatype.sql_type()))
            .join(", ");
        format!("CREATE OR REPLACE TABLE {} ({definitions})", quote_ident(table))
    }
}

/// Double-quotes an identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// An upload with canonical headers and typed cells.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub schema: TableSchema,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl NormalizedTable {
    pub fn from_raw(raw: &RawTable) -> Result<Self, InsightError> {
        if let Some((normalized, raw_names)) = columns::find_collisions(&raw.headers).into_iter().next() {
            return Err(InsightError::HeaderCollision {
                normalized,
                raw: raw_names,
            });
        }
        let headers = columns::normalize_headers(&raw.headers);
        let types = infer_column_types(headers.len(), &raw.rows);
        let schema = TableSchema {
            columns: headers
                .into_iter()
                .zip(types)
                .map(|(name, datatype)| ColumnMeta { name, datatype })
                .collect(),
        };
        debug!(
            "Inferred schema: {}",
            schema
                .columns
                .iter()
                .map(|c| format!("{}:{}", c.name, c.datatype))
                .join(", ")
        );
        let rows = raw
            .rows
            .iter()
            .map(|row| parse_typed_row(&schema, row))
            .collect();
        Ok(Self { schema, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn parse_typed_row(schema: &TableSchema, raw: &[String]) -> Vec<Option<Value>> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let cell = raw.get(idx).map(|s| s.trim()).unwrap_or("");
            if is_missing(cell) {
                return None;
            }
            // Inference saw every cell, so the parse only fails for String columns.
            parse_typed_value(cell, &column.datatype)
                .unwrap_or_else(|_| Some(Value::String(cell.to_string())))
        })
        .collect()
}

pub fn infer_column_types(column_count: usize, rows: &[Vec<String>]) -> Vec<ColumnType> {
    let mut candidates = vec![TypeCandidate::new(); column_count];
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            candidates[idx].update(cell);
        }
    }
    candidates.iter().map(TypeCandidate::decide).collect()
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    non_empty: usize,
    boolean_matches: usize,
    integer_matches: usize,
    float_matches: usize,
    unclassified: usize,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            non_empty: 0,
            boolean_matches: 0,
            integer_matches: 0,
            float_matches: 0,
            unclassified: 0,
        }
    }

    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if is_missing(trimmed) {
            return;
        }
        self.non_empty += 1;

        if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
            self.boolean_matches += 1;
        } else if trimmed.parse::<i64>().is_ok() {
            self.integer_matches += 1;
        } else if is_float_token(trimmed) {
            self.float_matches += 1;
        } else {
            self.unclassified += 1;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.non_empty == 0 || self.unclassified > 0 {
            return ColumnType::String;
        }
        if self.boolean_matches == self.non_empty {
            ColumnType::Boolean
        } else if self.integer_matches == self.non_empty {
            ColumnType::Integer
        } else if self.integer_matches + self.float_matches == self.non_empty {
            ColumnType::Float
        } else {
            ColumnType::String
        }
    }
}

// `inf`/`nan` parse as f64 but are words in a data file.
fn is_float_token(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
        && value.chars().any(|c| c.is_ascii_digit())
}

fn is_missing(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    matches!(
        value.to_ascii_lowercase().as_str(),
        "na" | "n/a" | "nan" | "null" | "none" | "#n/a"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn infer_column_types_distinguishes_storage_types() {
        let data = rows(&[
            &["s1", "2020", "0.5", "true", "1"],
            &["s2", "2021", "3", "False", "0"],
            &["s3", "NA", "", "TRUE", "1"],
        ]);
        let types = infer_column_types(5, &data);
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Boolean,
                ColumnType::Integer,
            ]
        );
    }

    #[test]
    fn yes_no_tokens_stay_textual() {
        let data = rows(&[&["yes"], &["no"]]);
        assert_eq!(infer_column_types(1, &data), vec![ColumnType::String]);
    }

    #[test]
    fn all_missing_column_is_string() {
        let data = rows(&[&["null"], &[""]]);
        assert_eq!(infer_column_types(1, &data), vec![ColumnType::String]);
    }

    #[test]
    fn numeric_expr_casts_textual_columns() {
        let schema = TableSchema {
            columns: vec![
                ColumnMeta {
                    name: "popularity".to_string(),
                    datatype: ColumnType::Integer,
                },
                ColumnMeta {
                    name: "followers".to_string(),
                    datatype: ColumnType::String,
                },
            ],
        };
        assert_eq!(schema.numeric_expr("popularity"), "\"popularity\"");
        assert_eq!(
            schema.numeric_expr("followers"),
            "TRY_CAST(\"followers\" AS DOUBLE)"
        );
    }

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn create_table_sql_lists_typed_columns() {
        let schema = TableSchema {
            columns: vec![
                ColumnMeta {
                    name: "show_id".to_string(),
                    datatype: ColumnType::String,
                },
                ColumnMeta {
                    name: "release_year".to_string(),
                    datatype: ColumnType::Integer,
                },
            ],
        };
        assert_eq!(
            schema.create_table_sql("data"),
            "CREATE OR REPLACE TABLE \"data\" (\"show_id\" VARCHAR, \"release_year\" BIGINT)"
        );
    }
}
