//! Error taxonomy for the inference pipeline.
//!
//! Only conditions that abort a run live here. A low-confidence encoding
//! guess or a column with poor type consistency is reported through the log
//! and the consistency report instead.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error(
        "failed to decode {} with {primary} or fallback {fallback}",
        path.display()
    )]
    Decoding {
        path: PathBuf,
        primary: String,
        fallback: String,
    },

    #[error("unknown encoding '{label}'")]
    UnknownEncoding { label: String },

    #[error(
        "header row {header_row} is beyond the {records} record(s) in {}",
        path.display()
    )]
    HeaderRowOutOfRange {
        path: PathBuf,
        header_row: usize,
        records: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("schema does not match {}: {detail}", path.display())]
    SchemaMismatch { path: PathBuf, detail: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

