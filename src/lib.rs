pub mod classify;
pub mod cli;
pub mod columns;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod filter;
pub mod io_utils;
pub mod loader;
pub mod preview;
pub mod report;
pub mod schema;
pub mod store;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, OutputFormat},
    dashboard::DashboardOptions,
    filter::{FilterSelection, RawFilters},
    schema::NormalizedTable,
    store::AnalyticalStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_insight", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Dashboard(args) => handle_dashboard(&args),
        Commands::Classify(args) => handle_classify(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

/// Reads an upload and replaces the store's table with it.
pub fn load_store(input: &Path, delimiter: Option<u8>) -> Result<AnalyticalStore> {
    let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
    info!(
        "Loading '{}' with delimiter '{}'",
        input.display(),
        printable_delimiter(delimiter)
    );
    let bytes = io_utils::read_input_bytes(input)?;
    let raw = loader::load_csv_bytes(&bytes, delimiter)
        .with_context(|| format!("Loading {input:?}"))?;
    let table = NormalizedTable::from_raw(&raw)
        .with_context(|| format!("Normalizing headers of {input:?}"))?;
    let mut store = AnalyticalStore::open_in_memory().context("Opening analytical store")?;
    store
        .load_table(&table)
        .with_context(|| format!("Loading {input:?} into the analytical store"))?;
    info!(
        "Loaded {} row(s) across {} column(s) ({})",
        table.row_count(),
        table.schema.columns.len(),
        raw.encoding.name()
    );
    Ok(store)
}

fn handle_dashboard(args: &cli::DashboardArgs) -> Result<()> {
    let mut store = load_store(&args.input, args.delimiter)?;
    let (selection, filter_notices) = FilterSelection::parse(&RawFilters {
        year: args.year.as_deref(),
        category: args.category.as_deref(),
        popularity_min: args.popularity_min.as_deref(),
        popularity_max: args.popularity_max.as_deref(),
    });
    let options = DashboardOptions {
        preview_rows: args.preview_rows,
        ..DashboardOptions::default()
    };
    let mut report = dashboard::build_report(&mut store, &selection, &options)
        .with_context(|| format!("Building dashboard for {:?}", args.input))?;
    report.notices.splice(0..0, filter_notices);

    match args.format {
        OutputFormat::Table => print!("{}", report.render_text()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serializing dashboard")?
        ),
    }
    Ok(())
}

fn handle_classify(args: &cli::ClassifyArgs) -> Result<()> {
    let store = load_store(&args.input, args.delimiter)?;
    let domain = classify::classify_store(&store)
        .with_context(|| format!("Classifying {:?}", args.input))?;
    println!("Dataset: {domain}");
    let headers = vec!["column".to_string(), "type".to_string()];
    let rows = store
        .schema()
        .columns
        .iter()
        .map(|column| vec![column.name.clone(), column.datatype.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
