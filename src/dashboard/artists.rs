//! Spotify artist dashboard. Takes no filters.

use super::recover;
use crate::{
    classify::DomainTag,
    data::Value,
    error::InsightError,
    report::{ChartDataset, ChartKind, DashboardReport, Kpi, Notice},
    schema::{ColumnType, TableSchema, quote_ident},
    store::{AnalyticalStore, TABLE_NAME},
};

pub const KPI_ARTIST_COUNT: &str = "artist_count";
pub const KPI_AVERAGE_POPULARITY: &str = "average_popularity";
pub const KPI_TOP_ARTIST: &str = "top_artist";
pub const KPI_TOP_ARTIST_FOLLOWERS: &str = "top_artist_followers";
pub const CHART_TOP_ARTISTS: &str = "Top 10 artists by followers";

const FOLLOWERS: &str = "followers";
const POPULARITY: &str = "popularity";
const NAME_COLUMNS: &[&str] = &["name", "artist_name", "artist"];
const TOP_ARTISTS: usize = 10;

pub fn build(store: &mut AnalyticalStore) -> Result<DashboardReport, InsightError> {
    let mut report = DashboardReport::new(DomainTag::SpotifyArtists);
    coerce_followers(store, &mut report.notices);

    let schema = store.schema().clone();
    let total = store.row_count()?;
    report
        .kpis
        .push(Kpi::new(KPI_ARTIST_COUNT, Some(Value::Integer(total))));
    if total == 0 {
        report.notices.push(Notice::EmptyResult);
        return Ok(report);
    }

    let average = recover(
        &mut report.notices,
        "average popularity",
        average_popularity(store, &schema),
    )
    .flatten();
    report.kpis.push(Kpi::new(KPI_AVERAGE_POPULARITY, average));

    let top = recover(
        &mut report.notices,
        "top artists",
        top_artists(store, &schema, TOP_ARTISTS),
    );
    let leader = top.as_ref().and_then(|chart| chart.rows.first());
    report.kpis.push(Kpi::new(
        KPI_TOP_ARTIST,
        leader.and_then(|row| row.first().cloned().flatten()),
    ));
    report.kpis.push(Kpi::new(
        KPI_TOP_ARTIST_FOLLOWERS,
        leader.and_then(|row| row.get(1).cloned().flatten()),
    ));
    if let Some(chart) = top {
        report.charts.push(chart);
    }
    Ok(report)
}

fn coerce_followers(store: &mut AnalyticalStore, notices: &mut Vec<Notice>) {
    if store.schema().column_type(FOLLOWERS) == Some(ColumnType::Integer) {
        return;
    }
    if let Err(err) = store.coerce_column(FOLLOWERS, ColumnType::Integer) {
        notices.push(Notice::MalformedValue {
            field: FOLLOWERS.to_string(),
            message: format!("left as text: {err}"),
        });
    }
}

fn average_popularity(
    store: &AnalyticalStore,
    schema: &TableSchema,
) -> Result<Option<Value>, InsightError> {
    let sql = format!(
        "SELECT CAST(AVG({}) AS DOUBLE) FROM {}",
        schema.numeric_expr(POPULARITY),
        quote_ident(TABLE_NAME)
    );
    store.query_scalar(&sql, &[])
}

fn top_artists(
    store: &AnalyticalStore,
    schema: &TableSchema,
    limit: usize,
) -> Result<ChartDataset, InsightError> {
    let label = match schema.first_present(NAME_COLUMNS) {
        Some(name) => format!("CAST({} AS VARCHAR)", quote_ident(name)),
        None => "''".to_string(),
    };
    let followers = schema.numeric_expr(FOLLOWERS);
    let popularity = if schema.has_column(POPULARITY) {
        schema.numeric_expr(POPULARITY)
    } else {
        "NULL".to_string()
    };
    let sql = format!(
        "SELECT {label} AS artist, {followers} AS followers, {popularity} AS popularity \
         FROM {} WHERE {followers} IS NOT NULL ORDER BY 2 DESC, 1 LIMIT {limit}",
        quote_ident(TABLE_NAME)
    );
    let result = store.query(&sql, &[])?;
    Ok(ChartDataset::from_query(CHART_TOP_ARTISTS, ChartKind::Bar, result))
}
