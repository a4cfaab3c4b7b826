//! Per-domain KPI and chart construction.
//!
//! [`build_report`] is one render pass: classify the loaded table, then hand the
//! store and the user's filter selection to the builder for that domain. Only
//! failures of mandatory steps (classification, the base row count) abort the
//! pass; everything optional degrades to a [`Notice`].
//!
//! An unrecognized upload gets only a preview of its first rows. The preview
//! reads back the loaded table, so it shows canonical column names and typed
//! cells rather than the header text and strings of the file.

pub mod artists;
pub mod netflix;
pub mod tracks;

use duckdb::types::Value as SqlValue;
use log::{info, warn};

use crate::{
    classify::{self, DomainTag},
    error::InsightError,
    filter::{FilterSelection, WhereClause},
    report::{ChartDataset, ChartKind, DashboardReport, Notice},
    schema::quote_ident,
    store::{AnalyticalStore, TABLE_NAME},
};

pub const PREVIEW_TITLE: &str = "First rows";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub preview_rows: usize,
    pub box_sample_cap: usize,
    pub scatter_sample_cap: usize,
    pub histogram_buckets: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            box_sample_cap: 1000,
            scatter_sample_cap: 500,
            histogram_buckets: 20,
        }
    }
}

pub fn build_report(
    store: &mut AnalyticalStore,
    selection: &FilterSelection,
    options: &DashboardOptions,
) -> Result<DashboardReport, InsightError> {
    let domain = classify::classify_store(store)?;
    let report = match domain {
        DomainTag::Netflix => netflix::build(store, selection)?,
        DomainTag::SpotifyArtists => artists::build(store)?,
        DomainTag::SpotifyTracks => tracks::build(store, selection, options)?,
        DomainTag::Unknown => unknown_preview(store, options)?,
    };
    for notice in &report.notices {
        warn!("{}", notice.message());
    }
    info!(
        "Built {} dashboard: {} KPI(s), {} chart(s)",
        report.domain,
        report.kpis.len(),
        report.charts.len()
    );
    Ok(report)
}

/// First rows of the loaded table, as stored.
fn unknown_preview(
    store: &AnalyticalStore,
    options: &DashboardOptions,
) -> Result<DashboardReport, InsightError> {
    let mut report = DashboardReport::new(DomainTag::Unknown);
    report.notices.push(Notice::UnrecognizedSchema);
    let preview = store.preview(options.preview_rows)?;
    report.preview = Some(ChartDataset::from_query(PREVIEW_TITLE, ChartKind::Table, preview));
    Ok(report)
}

/// Share of `part` in `total` as a percentage. A zero total counts as one.
pub fn percentage(part: i64, total: i64) -> f64 {
    let denominator = total.max(1) as f64;
    (part.max(0) as f64 / denominator * 100.0).clamp(0.0, 100.0)
}

pub(crate) fn count_rows(store: &AnalyticalStore, clause: &WhereClause) -> Result<i64, InsightError> {
    let sql = format!("SELECT COUNT(*) FROM {} {}", quote_ident(TABLE_NAME), clause.sql());
    Ok(store
        .query_scalar(&sql, clause.params())?
        .and_then(|value| value.as_i64())
        .unwrap_or(0))
}

/// Keeps the value of an optional computation, or records why it is missing.
pub(crate) fn recover<T>(
    notices: &mut Vec<Notice>,
    item: &str,
    result: Result<T, InsightError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            notices.push(Notice::QueryFailed {
                item: item.to_string(),
                message: err.to_string(),
            });
            None
        }
    }
}

/// Bound values for a query whose own placeholders precede the clause's.
pub(crate) fn params_with(leading: &[SqlValue], clause: &WhereClause) -> Vec<SqlValue> {
    leading.iter().cloned().chain(clause.params().iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 100.0);
        assert!((percentage(2, 3) - 66.666).abs() < 0.01);
        assert_eq!(percentage(3, 3), 100.0);
    }

    #[test]
    fn params_with_puts_leading_values_first() {
        let clause = WhereClause::new().eq("x", SqlValue::BigInt(2));
        let params = params_with(&[SqlValue::Double(1.0)], &clause);
        assert_eq!(params, vec![SqlValue::Double(1.0), SqlValue::BigInt(2)]);
    }
}
