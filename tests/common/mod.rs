#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_insight::{
    dashboard::{self, DashboardOptions},
    filter::{FilterSelection, RawFilters},
    loader::load_csv_bytes,
    report::DashboardReport,
    schema::NormalizedTable,
    store::AnalyticalStore,
};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture_bytes(name: &str) -> Vec<u8> {
    fs::read(fixture_path(name)).expect("read fixture")
}

/// Loads CSV bytes into a fresh store the way an upload would be.
pub fn store_from_bytes(bytes: &[u8]) -> AnalyticalStore {
    let raw = load_csv_bytes(bytes, b',').expect("decode upload");
    let table = NormalizedTable::from_raw(&raw).expect("normalize headers");
    let mut store = AnalyticalStore::open_in_memory().expect("open store");
    store.load_table(&table).expect("load table");
    store
}

pub fn store_from(csv: &str) -> AnalyticalStore {
    store_from_bytes(csv.as_bytes())
}

/// Runs one full render pass over `csv` with the given raw filter text.
pub fn report_for(csv: &str, filters: RawFilters<'_>) -> DashboardReport {
    report_with_options(csv, filters, &DashboardOptions::default())
}

pub fn report_with_options(
    csv: &str,
    filters: RawFilters<'_>,
    options: &DashboardOptions,
) -> DashboardReport {
    let mut store = store_from(csv);
    let (selection, notices) = FilterSelection::parse(&filters);
    let mut report =
        dashboard::build_report(&mut store, &selection, options).expect("build report");
    report.notices.splice(0..0, notices);
    report
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
