//! Spotify track dashboard.
//!
//! Every KPI and chart is scoped to the inclusive popularity range. Bounds the
//! user leaves open default to the column's observed minimum and maximum, or
//! `[0, 100]` when the column holds no numbers at all.

use duckdb::types::Value as SqlValue;
use log::debug;

use super::{DashboardOptions, count_rows, params_with, percentage, recover};
use crate::{
    classify::DomainTag,
    data::Value,
    error::InsightError,
    filter::{FilterSelection, PopularityRange, WhereClause},
    report::{ChartDataset, ChartKind, DashboardReport, Kpi, Notice},
    schema::{TableSchema, quote_ident},
    store::{AnalyticalStore, TABLE_NAME},
};

pub const KPI_TOTAL: &str = "total_tracks";
pub const KPI_AVERAGE_POPULARITY: &str = "average_popularity";
pub const KPI_TOTAL_HOURS: &str = "total_hours";
pub const KPI_EXPLICIT_RATE: &str = "explicit_rate";
pub const CHART_POPULARITY: &str = "Popularity distribution";
pub const CHART_DURATION: &str = "Duration (minutes)";
pub const CHART_ENERGY: &str = "Energy vs danceability";

/// Textual forms of the explicit flag that count as explicit.
pub const EXPLICIT_LITERALS: &[&str] = &["true", "True", "1"];

const POPULARITY: &str = "popularity";
const DURATION: &str = "duration_ms";
const EXPLICIT: &str = "explicit";
const ENERGY: &str = "energy";
const DANCEABILITY: &str = "danceability";
const LABEL_COLUMNS: &[&str] = &["track_name", "name"];
const DEFAULT_BOUNDS: PopularityRange = PopularityRange { min: 0.0, max: 100.0 };

pub fn build(
    store: &AnalyticalStore,
    selection: &FilterSelection,
    options: &DashboardOptions,
) -> Result<DashboardReport, InsightError> {
    let schema = store.schema().clone();
    let mut report = DashboardReport::new(DomainTag::SpotifyTracks);

    let mut clause = WhereClause::new();
    if schema.has_column(POPULARITY) {
        let observed = recover(
            &mut report.notices,
            "popularity bounds",
            observed_bounds(store, &schema),
        )
        .unwrap_or(DEFAULT_BOUNDS);
        report.filter_options.popularity_bounds = Some((observed.min, observed.max));
        let (range, notice) = selection.resolve_popularity(observed);
        report.notices.extend(notice);
        debug!("Popularity range {} - {}", range.min, range.max);
        clause = clause.between(&schema.numeric_expr(POPULARITY), range.min, range.max);
    } else if selection.popularity_min.is_some() || selection.popularity_max.is_some() {
        report.notices.push(Notice::MalformedValue {
            field: "popularity range".to_string(),
            message: format!("dataset has no {POPULARITY} column"),
        });
    }

    let total = count_rows(store, &clause)?;
    report.kpis.push(Kpi::new(KPI_TOTAL, Some(Value::Integer(total))));
    if total == 0 {
        report.notices.push(Notice::EmptyResult);
        return Ok(report);
    }

    let average = recover(
        &mut report.notices,
        "average popularity",
        aggregate(store, &clause, &format!("AVG({})", schema.numeric_expr(POPULARITY))),
    )
    .flatten();
    report.kpis.push(Kpi::new(KPI_AVERAGE_POPULARITY, average));

    let hours = recover(
        &mut report.notices,
        "total hours",
        aggregate(
            store,
            &clause,
            &format!(
                "COALESCE(SUM({}), 0) / 1000.0 / 3600.0",
                schema.numeric_expr(DURATION)
            ),
        ),
    )
    .flatten();
    report.kpis.push(Kpi::new(KPI_TOTAL_HOURS, hours));

    let explicit = recover(
        &mut report.notices,
        "explicit rate",
        explicit_count(store, &clause),
    )
    .map(|count| Value::Float(percentage(count, total)));
    report.kpis.push(Kpi::new(KPI_EXPLICIT_RATE, explicit));

    if let Some(chart) = recover(
        &mut report.notices,
        "popularity histogram",
        popularity_histogram(store, &schema, &clause, options.histogram_buckets),
    ) {
        report.charts.push(chart);
    }
    if let Some(chart) = recover(
        &mut report.notices,
        "duration sample",
        duration_sample(store, &schema, &clause, options.box_sample_cap),
    ) {
        report.charts.push(chart);
    }
    if let Some(chart) = recover(
        &mut report.notices,
        "energy sample",
        energy_sample(store, &schema, &clause, options.scatter_sample_cap),
    ) {
        report.charts.push(chart);
    }
    Ok(report)
}

fn observed_bounds(
    store: &AnalyticalStore,
    schema: &TableSchema,
) -> Result<PopularityRange, InsightError> {
    let expr = schema.numeric_expr(POPULARITY);
    let sql = format!(
        "SELECT CAST(MIN({expr}) AS DOUBLE), CAST(MAX({expr}) AS DOUBLE) FROM {}",
        quote_ident(TABLE_NAME)
    );
    let row = store.query_row(&sql, &[])?.unwrap_or_default();
    let bound = |idx: usize| row.get(idx).and_then(Option::as_ref).and_then(Value::as_f64);
    Ok(match (bound(0), bound(1)) {
        (Some(min), Some(max)) => PopularityRange { min, max },
        _ => DEFAULT_BOUNDS,
    })
}

fn aggregate(
    store: &AnalyticalStore,
    clause: &WhereClause,
    expr: &str,
) -> Result<Option<Value>, InsightError> {
    let sql = format!(
        "SELECT CAST({expr} AS DOUBLE) FROM {} {}",
        quote_ident(TABLE_NAME),
        clause.sql()
    );
    store.query_scalar(&sql, clause.params())
}

fn explicit_count(store: &AnalyticalStore, clause: &WhereClause) -> Result<i64, InsightError> {
    let placeholders = vec!["?"; EXPLICIT_LITERALS.len()].join(", ");
    let literals = EXPLICIT_LITERALS
        .iter()
        .map(|literal| SqlValue::Text(literal.to_string()))
        .collect::<Vec<_>>();
    let sql = format!(
        "SELECT COUNT(*) FILTER (WHERE CAST({} AS VARCHAR) IN ({placeholders})) FROM {} {}",
        quote_ident(EXPLICIT),
        quote_ident(TABLE_NAME),
        clause.sql()
    );
    Ok(store
        .query_scalar(&sql, &params_with(&literals, clause))?
        .and_then(|value| value.as_i64())
        .unwrap_or(0))
}

/// Fixed-width buckets over the filtered popularity span. The top edge falls
/// into the last bucket; a zero span puts everything in the first.
fn popularity_histogram(
    store: &AnalyticalStore,
    schema: &TableSchema,
    clause: &WhereClause,
    buckets: usize,
) -> Result<ChartDataset, InsightError> {
    let buckets = buckets.max(1);
    let popularity = schema.numeric_expr(POPULARITY);
    let clause = clause.clone().not_null(&popularity);
    let span_sql = format!(
        "SELECT CAST(MIN({popularity}) AS DOUBLE), CAST(MAX({popularity}) AS DOUBLE) FROM {} {}",
        quote_ident(TABLE_NAME),
        clause.sql()
    );
    let span = store.query_row(&span_sql, clause.params())?.unwrap_or_default();
    let edge = |idx: usize| span.get(idx).and_then(Option::as_ref).and_then(Value::as_f64);
    let (lo, hi) = match (edge(0), edge(1)) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            return Ok(ChartDataset {
                title: CHART_POPULARITY.to_string(),
                kind: ChartKind::Histogram,
                columns: histogram_columns(),
                rows: Vec::new(),
            });
        }
    };
    let width = if hi > lo { (hi - lo) / buckets as f64 } else { 1.0 };

    let sql = format!(
        "SELECT GREATEST(LEAST(CAST(FLOOR(({popularity} - CAST(? AS DOUBLE)) / CAST(? AS DOUBLE)) AS BIGINT), {last}), 0) AS bucket, \
         COUNT(*) AS tracks FROM {} {} GROUP BY 1 ORDER BY 1",
        quote_ident(TABLE_NAME),
        clause.sql(),
        last = buckets - 1
    );
    let params = params_with(&[SqlValue::Double(lo), SqlValue::Double(width)], &clause);
    let result = store.query(&sql, &params)?;

    let mut counts = vec![0_i64; buckets];
    for row in &result.rows {
        let bucket = row.first().and_then(Option::as_ref).and_then(Value::as_i64);
        let tracks = row.get(1).and_then(Option::as_ref).and_then(Value::as_i64);
        if let (Some(bucket), Some(tracks)) = (bucket, tracks) {
            if let Some(slot) = usize::try_from(bucket).ok().and_then(|b| counts.get_mut(b)) {
                *slot += tracks;
            }
        }
    }
    let rows = counts
        .into_iter()
        .enumerate()
        .map(|(idx, tracks)| {
            vec![
                Some(Value::Float(lo + idx as f64 * width)),
                Some(Value::Float(lo + (idx + 1) as f64 * width)),
                Some(Value::Integer(tracks)),
            ]
        })
        .collect();
    Ok(ChartDataset {
        title: CHART_POPULARITY.to_string(),
        kind: ChartKind::Histogram,
        columns: histogram_columns(),
        rows,
    })
}

fn histogram_columns() -> Vec<String> {
    ["bucket_start", "bucket_end", "tracks"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn duration_sample(
    store: &AnalyticalStore,
    schema: &TableSchema,
    clause: &WhereClause,
    cap: usize,
) -> Result<ChartDataset, InsightError> {
    let duration = schema.numeric_expr(DURATION);
    let clause = clause.clone().not_null(&duration);
    let sql = format!(
        "SELECT {duration} / 60000.0 AS duration_min FROM {} {} ORDER BY random() LIMIT {cap}",
        quote_ident(TABLE_NAME),
        clause.sql()
    );
    let result = store.query(&sql, clause.params())?;
    Ok(ChartDataset::from_query(CHART_DURATION, ChartKind::Box, result))
}

fn energy_sample(
    store: &AnalyticalStore,
    schema: &TableSchema,
    clause: &WhereClause,
    cap: usize,
) -> Result<ChartDataset, InsightError> {
    let label = match schema.first_present(LABEL_COLUMNS) {
        Some(name) => format!("COALESCE(CAST({} AS VARCHAR), '')", quote_ident(name)),
        None => "''".to_string(),
    };
    let popularity = if schema.has_column(POPULARITY) {
        schema.numeric_expr(POPULARITY)
    } else {
        "NULL".to_string()
    };
    let sql = format!(
        "SELECT {energy} AS energy, {dance} AS danceability, {popularity} AS popularity, \
         {label} AS label FROM {} {} ORDER BY random() LIMIT {cap}",
        quote_ident(TABLE_NAME),
        clause.sql(),
        energy = schema.numeric_expr(ENERGY),
        dance = schema.numeric_expr(DANCEABILITY),
    );
    let result = store.query(&sql, clause.params())?;
    Ok(ChartDataset::from_query(CHART_ENERGY, ChartKind::Scatter, result))
}
