//! Errors raised by the driver while reading inputs and writing scores.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid JSON line: {source}")]
    JsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Input files of one category disagree in length.
    #[error("{category}: {responses} responses for {items} test items and {answers} possible answers")]
    LengthMismatch {
        category: String,
        items: usize,
        answers: usize,
        responses: usize,
    },

    #[error(transparent)]
    Core(#[from] callcheck_core::CoreError),

    #[error(transparent)]
    Rest(#[from] callcheck_check::RestError),
}
