//! Structured dashboard output handed to the renderer.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    classify::DomainTag,
    data::{Value, display_cell},
    store::QueryResult,
    table,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub name: String,
    pub value: Option<Value>,
}

impl Kpi {
    pub fn new(name: &str, value: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Area,
    Bar,
    Histogram,
    Box,
    Scatter,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub title: String,
    pub kind: ChartKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl ChartDataset {
    pub fn from_query(title: &str, kind: ChartKind, result: QueryResult) -> Self {
        Self {
            title: title.to_string(),
            kind,
            columns: result.columns,
            rows: result.rows,
        }
    }

    pub fn column(&self, name: &str) -> Vec<Option<&Value>> {
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => self.rows.iter().map(|row| row.get(idx).and_then(Option::as_ref)).collect(),
            None => Vec::new(),
        }
    }
}

/// Inline, non-fatal conditions surfaced next to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    UnrecognizedSchema,
    EmptyResult,
    MalformedValue { field: String, message: String },
    QueryFailed { item: String, message: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::UnrecognizedSchema => {
                "Dataset not recognized; showing the first rows instead".to_string()
            }
            Notice::EmptyResult => "No data for this filter".to_string(),
            Notice::MalformedValue { field, message } => format!("Ignored {field}: {message}"),
            Notice::QueryFailed { item, message } => format!("Could not compute {item}: {message}"),
        }
    }
}

/// Values a renderer offers in its filter widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub years: Vec<i64>,
    pub categories: Vec<String>,
    pub popularity_bounds: Option<(f64, f64)>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() && self.categories.is_empty() && self.popularity_bounds.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub domain: DomainTag,
    pub filter_options: FilterOptions,
    pub kpis: Vec<Kpi>,
    pub charts: Vec<ChartDataset>,
    pub preview: Option<ChartDataset>,
    pub notices: Vec<Notice>,
}

impl DashboardReport {
    pub fn new(domain: DomainTag) -> Self {
        Self {
            domain,
            filter_options: FilterOptions::default(),
            kpis: Vec::new(),
            charts: Vec::new(),
            preview: None,
            notices: Vec::new(),
        }
    }

    pub fn kpi(&self, name: &str) -> Option<&Value> {
        self.kpis
            .iter()
            .find(|kpi| kpi.name == name)
            .and_then(|kpi| kpi.value.as_ref())
    }

    pub fn chart(&self, title: &str) -> Option<&ChartDataset> {
        self.charts.iter().find(|chart| chart.title == title)
    }

    pub fn has_notice(&self, notice: &Notice) -> bool {
        self.notices.contains(notice)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dataset: {}", self.domain);

        if !self.filter_options.is_empty() {
            let options = &self.filter_options;
            if !options.years.is_empty() {
                let years = options.years.iter().map(i64::to_string).collect::<Vec<_>>();
                let _ = writeln!(out, "Years: all, {}", years.join(", "));
            }
            if !options.categories.is_empty() {
                let _ = writeln!(out, "Categories: all, {}", options.categories.join(", "));
            }
            if let Some((min, max)) = options.popularity_bounds {
                let _ = writeln!(out, "Popularity range: {min} - {max}");
            }
        }

        for notice in &self.notices {
            let _ = writeln!(out, "! {}", notice.message());
        }

        if !self.kpis.is_empty() {
            let _ = writeln!(out);
            let headers = vec!["metric".to_string(), "value".to_string()];
            let rows = self
                .kpis
                .iter()
                .map(|kpi| vec![kpi.name.clone(), format_kpi(kpi.value.as_ref())])
                .collect::<Vec<_>>();
            out.push_str(&table::render_table(&headers, &rows));
        }

        for chart in self.charts.iter().chain(self.preview.iter()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{} [{}]", chart.title, chart_kind_label(chart.kind));
            let rows = chart
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| display_cell(cell.as_ref())).collect())
                .collect::<Vec<Vec<String>>>();
            out.push_str(&table::render_table(&chart.columns, &rows));
        }
        out
    }
}

fn format_kpi(value: Option<&Value>) -> String {
    match value {
        Some(Value::Float(f)) => format!("{f:.2}"),
        other => display_cell(other),
    }
}

fn chart_kind_label(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Area => "area",
        ChartKind::Bar => "bar",
        ChartKind::Histogram => "histogram",
        ChartKind::Box => "box",
        ChartKind::Scatter => "scatter",
        ChartKind::Table => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_text_lists_notices_and_kpis() {
        let mut report = DashboardReport::new(DomainTag::SpotifyTracks);
        report.kpis.push(Kpi::new("total", Some(Value::Integer(0))));
        report.notices.push(Notice::EmptyResult);
        let text = report.render_text();
        assert!(text.contains("Dataset: SPOTIFY_TRACKS"));
        assert!(text.contains("! No data for this filter"));
        assert!(text.contains("total"));
    }

    #[test]
    fn float_kpis_render_with_two_decimals() {
        assert_eq!(format_kpi(Some(&Value::Float(66.6666))), "66.67");
        assert_eq!(format_kpi(None), "");
    }

    #[test]
    fn notices_serialize_with_kind_tag() {
        let json = serde_json::to_string(&Notice::MalformedValue {
            field: "year".to_string(),
            message: "not a number".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"kind":"malformed_value","field":"year","message":"not a number"}"#
        );
    }
}
