//! Error types for expression evaluation.
//!
//! Every failure while lexing, parsing or evaluating a candidate expression
//! is an [`ExecError`]. The executable checkers turn these into
//! `execution_error` verdicts; they never escape the checker.

use serde::{Deserialize, Serialize};

/// Failure raised inside a helper function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum HelperError {
    #[error("missing required argument '{name}'")]
    MissingArgument { name: String },

    #[error("argument '{name}' must be {expected}, got {found}")]
    InvalidArgument {
        name: String,
        expected: String,
        found: String,
    },

    #[error("{message}")]
    Domain { message: String },
}

impl HelperError {
    pub fn domain(message: impl Into<String>) -> Self {
        HelperError::Domain {
            message: message.into(),
        }
    }
}

/// Errors produced while evaluating a candidate expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ExecError {
    #[error("invalid syntax at offset {offset}: {message}")]
    Lex { offset: usize, message: String },

    #[error("invalid syntax at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("expression nesting exceeds {limit} levels")]
    NestingLimitExceeded { limit: usize },

    #[error("name '{name}' is not defined")]
    UnknownName { name: String },

    #[error("function '{name}' is not defined")]
    UnknownFunction { name: String },

    #[error("{function}() got an unexpected keyword argument '{name}'")]
    UnexpectedArgument { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument { function: String, name: String },

    #[error("{function}() takes {expected} positional argument(s) but {found} were given")]
    TooManyArguments {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("bad operand type for unary {op}: '{found}'")]
    BadOperand { op: char, found: String },

    #[error("unhashable dictionary key: {key}")]
    InvalidKey { key: String },

    #[error("{function}(): {source}")]
    Helper {
        function: String,
        #[source]
        source: HelperError,
    },
}
