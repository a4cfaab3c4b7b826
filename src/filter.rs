//! Filter selections and the parameterized `WHERE` clauses built from them.
//!
//! User input arrives as free text (`"2020"`, `"all"`, `"Movie"`). Parsing never
//! fails: anything that cannot be understood becomes a
//! [`Notice::MalformedValue`] and the filter falls back to "all". Selected
//! values are always bound as parameters, never spliced into SQL text.

use duckdb::types::Value as SqlValue;

use crate::report::Notice;

pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopularityRange {
    pub min: f64,
    pub max: f64,
}

/// Raw filter text as entered by the user; `None` means untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFilters<'a> {
    pub year: Option<&'a str>,
    pub category: Option<&'a str>,
    pub popularity_min: Option<&'a str>,
    pub popularity_max: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSelection {
    pub year: YearFilter,
    pub category: CategoryFilter,
    pub popularity_min: Option<f64>,
    pub popularity_max: Option<f64>,
}

impl FilterSelection {
    pub fn parse(raw: &RawFilters<'_>) -> (Self, Vec<Notice>) {
        let mut notices = Vec::new();
        let mut selection = FilterSelection::default();

        if let Some(text) = raw.year.map(str::trim).filter(|t| !is_all(t)) {
            match text.parse::<i64>() {
                Ok(year) => selection.year = YearFilter::Year(year),
                Err(_) => notices.push(malformed("year", format!("'{text}' is not a year"))),
            }
        }

        if let Some(text) = raw.category.map(str::trim).filter(|t| !is_all(t)) {
            selection.category = CategoryFilter::Category(text.to_string());
        }

        selection.popularity_min = parse_bound("popularity minimum", raw.popularity_min, &mut notices);
        selection.popularity_max = parse_bound("popularity maximum", raw.popularity_max, &mut notices);

        (selection, notices)
    }

    /// Fills unset bounds from the column's observed bounds. An inverted range
    /// is reported and replaced by the observed bounds.
    pub fn resolve_popularity(&self, observed: PopularityRange) -> (PopularityRange, Option<Notice>) {
        let range = PopularityRange {
            min: self.popularity_min.unwrap_or(observed.min),
            max: self.popularity_max.unwrap_or(observed.max),
        };
        if range.min > range.max {
            let notice = malformed(
                "popularity range",
                format!("minimum {} exceeds maximum {}", range.min, range.max),
            );
            return (observed, Some(notice));
        }
        (range, None)
    }
}

fn is_all(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case(ALL)
}

fn parse_bound(field: &str, raw: Option<&str>, notices: &mut Vec<Notice>) -> Option<f64> {
    let text = raw.map(str::trim).filter(|t| !t.is_empty())?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            notices.push(malformed(field, format!("'{text}' is not a number")));
            None
        }
    }
}

fn malformed(field: &str, message: String) -> Notice {
    Notice::MalformedValue {
        field: field.to_string(),
        message,
    }
}

/// `WHERE 1=1 AND ...` with positional parameters.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    params: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// `expr = ?`; `expr` is an SQL expression, not user input.
    pub fn eq(mut self, expr: &str, value: SqlValue) -> Self {
        self.conditions.push(format!("{expr} = ?"));
        self.params.push(value);
        self
    }

    /// Inclusive range on `expr`.
    pub fn between(mut self, expr: &str, min: f64, max: f64) -> Self {
        self.conditions.push(format!("{expr} BETWEEN CAST(? AS DOUBLE) AND CAST(? AS DOUBLE)"));
        self.params.push(SqlValue::Double(min));
        self.params.push(SqlValue::Double(max));
        self
    }

    pub fn not_null(mut self, expr: &str) -> Self {
        self.conditions.push(format!("{expr} IS NOT NULL"));
        self
    }

    pub fn sql(&self) -> String {
        let mut sql = String::from("WHERE 1=1");
        for condition in &self.conditions {
            sql.push_str(" AND ");
            sql.push_str(condition);
        }
        sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::quote_ident;

    #[test]
    fn parse_accepts_all_and_explicit_values() {
        let (selection, notices) = FilterSelection::parse(&RawFilters {
            year: Some("2020"),
            category: Some("Movie"),
            popularity_min: Some("10"),
            popularity_max: None,
        });
        assert!(notices.is_empty());
        assert_eq!(selection.year, YearFilter::Year(2020));
        assert_eq!(selection.category, CategoryFilter::Category("Movie".to_string()));
        assert_eq!(selection.popularity_min, Some(10.0));
        assert_eq!(selection.popularity_max, None);

        let (selection, notices) = FilterSelection::parse(&RawFilters {
            year: Some("ALL"),
            category: Some("all"),
            ..RawFilters::default()
        });
        assert!(notices.is_empty());
        assert_eq!(selection, FilterSelection::default());
    }

    #[test]
    fn malformed_values_fall_back_with_notice() {
        let (selection, notices) = FilterSelection::parse(&RawFilters {
            year: Some("20x0"),
            popularity_max: Some("lots"),
            ..RawFilters::default()
        });
        assert_eq!(selection.year, YearFilter::All);
        assert_eq!(selection.popularity_max, None);
        assert_eq!(notices.len(), 2);
        assert!(matches!(&notices[0], Notice::MalformedValue { field, .. } if field == "year"));
    }

    #[test]
    fn resolve_popularity_fills_missing_bounds() {
        let selection = FilterSelection {
            popularity_min: Some(40.0),
            ..FilterSelection::default()
        };
        let (range, notice) = selection.resolve_popularity(PopularityRange { min: 0.0, max: 90.0 });
        assert_eq!(range, PopularityRange { min: 40.0, max: 90.0 });
        assert!(notice.is_none());
    }

    #[test]
    fn inverted_range_reverts_to_observed_bounds() {
        let selection = FilterSelection {
            popularity_min: Some(80.0),
            popularity_max: Some(20.0),
            ..FilterSelection::default()
        };
        let observed = PopularityRange { min: 0.0, max: 100.0 };
        let (range, notice) = selection.resolve_popularity(observed);
        assert_eq!(range, observed);
        assert!(notice.is_some());
    }

    #[test]
    fn where_clause_binds_every_value() {
        let clause = WhereClause::new()
            .eq("\"type\"", SqlValue::Text("Movie'; DROP TABLE data; --".to_string()))
            .between("\"popularity\"", 1.0, 2.0)
            .not_null(&quote_ident("country"));
        assert_eq!(
            clause.sql(),
            "WHERE 1=1 AND \"type\" = ? AND \"popularity\" BETWEEN CAST(? AS DOUBLE) AND CAST(? AS DOUBLE) AND \"country\" IS NOT NULL"
        );
        assert_eq!(clause.params().len(), 3);
    }
}
