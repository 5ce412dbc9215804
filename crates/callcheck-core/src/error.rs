//! Core error types for callcheck-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! malformed benchmark data encountered while loading items.

use thiserror::Error;

/// Errors produced while interpreting benchmark data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An expected call object must name exactly one function.
    #[error("expected call must name exactly one function, found {found}")]
    MalformedExpectedCall { found: usize },

    /// A test category name was not recognized.
    #[error("unknown test category: '{0}'")]
    UnknownCategory(String),

    /// A category group name was not recognized.
    #[error("unknown category group: '{0}'")]
    UnknownGroup(String),

    /// A target language name was not recognized.
    #[error("unknown test language: '{0}'")]
    UnknownLanguage(String),
}
