//! Plain-text tables for KPI lists, chart datasets and previews.

use std::fmt::Write as _;

/// Cells longer than this are cut and end in `…`.
pub const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let cells = rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|idx| fit_cell(row.get(idx).map(String::as_str).unwrap_or_default()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let headers = headers.iter().map(|h| fit_cell(h)).collect::<Vec<_>>();

    let widths = (0..headers.len())
        .map(|idx| {
            cells
                .iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(headers[idx].chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect::<Vec<_>>();
    let aligns = (0..headers.len())
        .map(|idx| column_alignment(cells.iter().map(|row| row[idx].as_str())))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let header_aligns = vec![Align::Left; headers.len()];
    let _ = writeln!(output, "{}", format_row(&headers, &widths, &header_aligns));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &header_aligns));
    for row in &cells {
        let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Numbers are right-aligned when every non-empty cell of the column is one.
fn column_alignment<'a>(mut values: impl Iterator<Item = &'a str>) -> Align {
    let mut seen = false;
    let numeric = values.all(|value| {
        if value.is_empty() {
            return true;
        }
        seen = true;
        value.parse::<f64>().is_ok()
    });
    if numeric && seen { Align::Right } else { Align::Left }
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .zip(aligns)
        .map(|((value, width), align)| match align {
            Align::Left => format!("{value:<width$}"),
            Align::Right => format!("{value:>width$}"),
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn fit_cell(value: &str) -> String {
    let flattened = value.replace(['\n', '\r', '\t'], " ");
    if flattened.chars().count() <= MAX_CELL_WIDTH {
        return flattened;
    }
    let mut cut = flattened.chars().take(MAX_CELL_WIDTH - 1).collect::<String>();
    cut.push('…');
    cut
}
