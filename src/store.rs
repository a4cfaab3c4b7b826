//! Embedded analytical store backed by an in-memory DuckDB database.
//!
//! The store holds exactly one working table, [`TABLE_NAME`]. Every load
//! replaces it wholesale; nothing from a previous upload survives. The caller
//! constructs one store per process and passes it to the classifier and query
//! builders. Mutating operations take `&mut self`, which keeps a single writer.

use std::collections::BTreeSet;

use duckdb::{Connection, appender_params_from_iter, params_from_iter, types::Value as SqlValue};
use log::{debug, info};
use serde::Serialize;

use crate::{
    data::{Value, from_value_ref, to_sql_value},
    error::InsightError,
    schema::{ColumnType, NormalizedTable, TableSchema, quote_ident},
};

pub const TABLE_NAME: &str = "data";

/// Rows returned by a query, cells converted to crate values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

pub struct AnalyticalStore {
    conn: Connection,
    schema: TableSchema,
}

impl AnalyticalStore {
    pub fn open_in_memory() -> Result<Self, InsightError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            schema: TableSchema::default(),
        })
    }

    /// Schema of the currently loaded table; empty before the first load.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn load_table(&mut self, table: &NormalizedTable) -> Result<(), InsightError> {
        let create_sql = table.schema.create_table_sql(TABLE_NAME);
        debug!("{create_sql}");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&create_sql)?;
        {
            let mut appender = tx.appender(TABLE_NAME)?;
            for row in &table.rows {
                appender.append_row(appender_params_from_iter(
                    row.iter().map(|cell| to_sql_value(cell.as_ref())),
                ))?;
            }
            appender.flush()?;
        }
        tx.commit()?;

        self.schema = table.schema.clone();
        info!(
            "Loaded {} row(s) into table '{TABLE_NAME}' ({} column(s))",
            table.row_count(),
            table.schema.columns.len()
        );
        Ok(())
    }

    /// Lowercased column names of the current table, read from the engine.
    pub fn column_names(&self) -> Result<BTreeSet<String>, InsightError> {
        let result = self.query(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
            &[SqlValue::Text(TABLE_NAME.to_string())],
        )?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.first().cloned().flatten())
            .map(|value| value.as_display().to_lowercase())
            .collect())
    }

    pub fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, InsightError> {
        debug!("{sql} {params:?}");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows_out = Vec::new();
        {
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            while let Some(row) = rows.next()? {
                let width = row.as_ref().column_count();
                let mut cells = Vec::with_capacity(width);
                for idx in 0..width {
                    cells.push(from_value_ref(row.get_ref(idx)?));
                }
                rows_out.push(cells);
            }
        }
        Ok(QueryResult {
            columns: stmt.column_names(),
            rows: rows_out,
        })
    }

    pub fn query_row(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<Option<Value>>>, InsightError> {
        Ok(self.query(sql, params)?.rows.into_iter().next())
    }

    pub fn query_scalar(&self, sql: &str, params: &[SqlValue]) -> Result<Option<Value>, InsightError> {
        Ok(self
            .query_row(sql, params)?
            .and_then(|row| row.into_iter().next())
            .flatten())
    }

    pub fn row_count(&self) -> Result<i64, InsightError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(TABLE_NAME));
        Ok(self
            .query_scalar(&sql, &[])?
            .and_then(|value| value.as_i64())
            .unwrap_or(0))
    }

    pub fn preview(&self, limit: usize) -> Result<QueryResult, InsightError> {
        let sql = format!("SELECT * FROM {} LIMIT {limit}", quote_ident(TABLE_NAME));
        self.query(&sql, &[])
    }

    /// Changes a column's storage type in place. On failure the table is left
    /// untouched.
    pub fn coerce_column(&mut self, column: &str, datatype: ColumnType) -> Result<(), InsightError> {
        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            quote_ident(TABLE_NAME),
            quote_ident(column),
            datatype.sql_type()
        );
        debug!("{sql}");
        self.conn.execute_batch(&sql)?;
        self.schema.set_column_type(column, datatype);
        Ok(())
    }
}
