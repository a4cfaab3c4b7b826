use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, data::display_cell, load_store, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let store = load_store(&args.input, args.delimiter)?;
    let result = store
        .preview(args.rows)
        .with_context(|| format!("Reading the first {} row(s)", args.rows))?;
    let rows = result
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| display_cell(cell.as_ref())).collect())
        .collect::<Vec<Vec<String>>>();
    table::print_table(&result.columns, &rows);
    info!("Displayed {} row(s) from {:?}", rows.len(), args.input);
    Ok(())
}
