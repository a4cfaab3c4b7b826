//! Error taxonomy for loading and querying uploaded datasets.
//!
//! Only failures that abort a render pass live here. Recoverable conditions
//! (empty filter results, malformed filter values, unknown schemas) are
//! reported as [`crate::report::Notice`] values instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    /// Neither UTF-8 nor Latin-1 produced a readable table.
    #[error("file could not be read (utf-8: {utf8}; latin-1: {latin1})")]
    Decode { utf8: String, latin1: String },
    #[error("columns {raw:?} all normalize to '{normalized}'")]
    HeaderCollision {
        normalized: String,
        raw: Vec<String>,
    },
    #[error("uploaded file has no header row")]
    MissingHeader,
    #[error(transparent)]
    Engine(#[from] duckdb::Error),
}
