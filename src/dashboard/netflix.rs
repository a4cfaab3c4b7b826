//! Netflix catalog dashboard.

use duckdb::types::Value as SqlValue;

use super::{count_rows, percentage, recover};
use crate::{
    classify::DomainTag,
    data::Value,
    error::InsightError,
    filter::{CategoryFilter, FilterSelection, WhereClause, YearFilter},
    report::{ChartDataset, ChartKind, DashboardReport, FilterOptions, Kpi, Notice},
    schema::{TableSchema, quote_ident},
    store::{AnalyticalStore, TABLE_NAME},
};

pub const KPI_TOTAL: &str = "total_titles";
pub const KPI_MOVIE_PERCENTAGE: &str = "movie_percentage";
pub const KPI_TOP_COUNTRY: &str = "top_country";
pub const KPI_STRATEGY: &str = "strategy";
pub const CHART_YEARLY: &str = "Titles per year by type";
pub const CHART_COUNTRIES: &str = "Top 5 countries";

const TYPE: &str = "type";
const RELEASE_YEAR: &str = "release_year";
const COUNTRY: &str = "country";
const MOVIE: &str = "Movie";
const TOP_COUNTRIES: usize = 5;

pub fn build(
    store: &AnalyticalStore,
    selection: &FilterSelection,
) -> Result<DashboardReport, InsightError> {
    let schema = store.schema().clone();
    let mut report = DashboardReport::new(DomainTag::Netflix);
    report.filter_options = filter_options(store, &schema, &mut report.notices);

    let clause = where_clause(&schema, selection, &mut report.notices);
    let total = count_rows(store, &clause)?;
    report.kpis.push(Kpi::new(KPI_TOTAL, Some(Value::Integer(total))));
    if total == 0 {
        report.notices.push(Notice::EmptyResult);
        return Ok(report);
    }

    let movies = count_rows(
        store,
        &clause
            .clone()
            .eq(&quote_ident(TYPE), SqlValue::Text(MOVIE.to_string())),
    )?;
    let movie_pct = percentage(movies, total);
    report
        .kpis
        .push(Kpi::new(KPI_MOVIE_PERCENTAGE, Some(Value::Float(movie_pct))));

    let countries = recover(
        &mut report.notices,
        "top countries",
        top_countries(store, &clause, TOP_COUNTRIES),
    );
    let top_country = countries
        .as_ref()
        .and_then(|chart| chart.rows.first())
        .and_then(|row| row.first().cloned().flatten());
    report.kpis.push(Kpi::new(KPI_TOP_COUNTRY, top_country));
    report.kpis.push(Kpi::new(
        KPI_STRATEGY,
        Some(Value::String(strategy_label(movie_pct).to_string())),
    ));

    if let Some(yearly) = recover(
        &mut report.notices,
        "yearly titles",
        yearly_by_type(store, &clause),
    ) {
        report.charts.push(yearly);
    }
    if let Some(countries) = countries {
        report.charts.push(countries);
    }
    Ok(report)
}

pub fn strategy_label(movie_pct: f64) -> &'static str {
    if movie_pct > 50.0 { "Cinema" } else { "Television" }
}

fn where_clause(
    schema: &TableSchema,
    selection: &FilterSelection,
    notices: &mut Vec<Notice>,
) -> WhereClause {
    let mut clause = WhereClause::new();
    if let YearFilter::Year(year) = selection.year {
        if schema.has_column(RELEASE_YEAR) {
            clause = clause.eq(&schema.numeric_expr(RELEASE_YEAR), SqlValue::BigInt(year));
        } else {
            notices.push(Notice::MalformedValue {
                field: "year".to_string(),
                message: format!("dataset has no {RELEASE_YEAR} column"),
            });
        }
    }
    if let CategoryFilter::Category(category) = &selection.category {
        clause = clause.eq(&quote_ident(TYPE), SqlValue::Text(category.clone()));
    }
    clause
}

fn filter_options(
    store: &AnalyticalStore,
    schema: &TableSchema,
    notices: &mut Vec<Notice>,
) -> FilterOptions {
    let mut options = FilterOptions::default();
    if schema.has_column(RELEASE_YEAR) {
        let year_expr = schema.numeric_expr(RELEASE_YEAR);
        let sql = format!(
            "SELECT DISTINCT {year_expr} AS year FROM {} WHERE {year_expr} IS NOT NULL ORDER BY 1 DESC",
            quote_ident(TABLE_NAME)
        );
        if let Some(result) = recover(notices, "year options", store.query(&sql, &[])) {
            options.years = result
                .rows
                .iter()
                .filter_map(|row| row.first().and_then(Option::as_ref))
                .filter_map(Value::as_i64)
                .collect();
        }
    }
    let sql = format!(
        "SELECT DISTINCT {col} FROM {} WHERE {col} IS NOT NULL ORDER BY 1",
        quote_ident(TABLE_NAME),
        col = quote_ident(TYPE)
    );
    if let Some(result) = recover(notices, "category options", store.query(&sql, &[])) {
        options.categories = result
            .rows
            .iter()
            .filter_map(|row| row.first().and_then(Option::as_ref))
            .map(Value::as_display)
            .collect();
    }
    options
}

fn top_countries(
    store: &AnalyticalStore,
    clause: &WhereClause,
    limit: usize,
) -> Result<ChartDataset, InsightError> {
    let country = quote_ident(COUNTRY);
    let clause = clause.clone().not_null(&country);
    let sql = format!(
        "SELECT trim(split_part(CAST({country} AS VARCHAR), ',', 1)) AS country, COUNT(*) AS titles \
         FROM {} {} GROUP BY 1 ORDER BY 2 DESC, 1 LIMIT {limit}",
        quote_ident(TABLE_NAME),
        clause.sql()
    );
    let result = store.query(&sql, clause.params())?;
    Ok(ChartDataset::from_query(CHART_COUNTRIES, ChartKind::Bar, result))
}

fn yearly_by_type(
    store: &AnalyticalStore,
    clause: &WhereClause,
) -> Result<ChartDataset, InsightError> {
    let sql = format!(
        "SELECT {year} AS release_year, {ty} AS type, COUNT(*) AS titles \
         FROM {} {} GROUP BY 1, 2 ORDER BY 1, 2",
        quote_ident(TABLE_NAME),
        clause.sql(),
        year = quote_ident(RELEASE_YEAR),
        ty = quote_ident(TYPE)
    );
    let result = store.query(&sql, clause.params())?;
    Ok(ChartDataset::from_query(CHART_YEARLY, ChartKind::Area, result))
}
