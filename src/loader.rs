//! Upload ingestion with encoding fallback.
//!
//! A file is parsed once as UTF-8. If any field fails to decode, or the CSV
//! itself is malformed, the whole file is parsed again as Latin-1. If both
//! passes fail the upload is rejected with [`InsightError::Decode`].

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::{info, warn};

use crate::{error::InsightError, io_utils};

/// Decoded upload: headers exactly as they appear in the first row.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub encoding: &'static Encoding,
}

pub fn load_csv_bytes(bytes: &[u8], delimiter: u8) -> Result<RawTable, InsightError> {
    let utf8_err = match parse_with_encoding(bytes, delimiter, UTF_8) {
        Ok(table) => return Ok(table),
        Err(err) => err,
    };
    warn!("UTF-8 read failed ({utf8_err:#}); retrying as Latin-1");
    // encoding_rs maps the `latin1` label to windows-1252.
    match parse_with_encoding(bytes, delimiter, WINDOWS_1252) {
        Ok(table) => Ok(table),
        Err(latin1_err) => Err(InsightError::Decode {
            utf8: format!("{utf8_err:#}"),
            latin1: format!("{latin1_err:#}"),
        }),
    }
}

fn parse_with_encoding(
    bytes: &[u8],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let mut reader = io_utils::open_csv_reader(io_utils::strip_bom(bytes), delimiter);
    let header_record = reader.byte_headers().context("Reading header row")?.clone();
    if header_record.is_empty() {
        return Err(InsightError::MissingHeader.into());
    }
    let headers = io_utils::decode_record(&header_record, encoding).context("Decoding header row")?;

    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", idx + 2))?;
        rows.push(decoded);
    }
    info!(
        "Read {} row(s) across {} column(s) as {}",
        rows.len(),
        headers.len(),
        encoding.name()
    );
    Ok(RawTable {
        headers,
        rows,
        encoding,
    })
}
