use std::path::PathBuf;

use thiserror::Error;

/// A single input row that could not be turned into a bio record.
///
/// These never abort a run; the pipeline logs and counts them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The row lacks the id or text column.
    #[error("Row at line {line} has {found} column(s), expected at least 2 (id, bio)")]
    MissingColumns {
        /// 1-based line in the input file.
        line: u64,
        /// Number of columns present.
        found: usize,
    },

    /// The CSV layer could not decode the row.
    #[error("Malformed CSV row at line {line}: {message}")]
    Csv {
        /// 1-based line in the input file.
        line: u64,
        /// Decoder message.
        message: String,
    },
}

/// Errors that terminate the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file could not be opened.
    #[error("Cannot open input file {}: {source}", path.display())]
    Input {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The output file could not be written.
    #[error("Cannot write output file {}: {source}", path.display())]
    Output {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Results could not be serialized.
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Missing or invalid configuration (credentials, flags).
    #[error("Configuration error: {0}")]
    Config(String),
}
