// error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning SNP-count tables into distributions.
///
/// Per-file variants always carry the `source_name` of the offending file so the
/// caller can report it and keep processing the other files.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Column '{column}' not found in '{source_name}' (line {row}).")]
    MissingColumn {
        source_name: String,
        column: String,
        row: usize,
    },

    #[error("Malformed SNP count '{value}' for gene '{gene}' at line {row} of '{source_name}': expected a non-negative integer.")]
    MalformedCount {
        source_name: String,
        row: usize,
        gene: String,
        value: String,
    },

    #[error("No header line found in '{source_name}'.")]
    EmptyInput { source_name: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path-to-name map {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

impl AggregationError {
    /// Name of the source file the error belongs to, when it is a per-file error.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            AggregationError::MissingColumn { source_name, .. }
            | AggregationError::MalformedCount { source_name, .. }
            | AggregationError::EmptyInput { source_name } => Some(source_name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregationError>;
