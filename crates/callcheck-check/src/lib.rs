//! Correctness checking for function-calling model outputs.
//!
//! - [`ast`]: structural checks of decoded calls against schemas and ground truth
//! - [`exec`]: evaluates call expressions and compares their results
//! - [`rest`]: issues GET requests and compares response shapes
//! - [`format`]: decoder-stage shape validation and relevance detection

pub mod ast;
pub mod config;
pub mod dialect;
pub mod exec;
pub mod format;
pub mod interpreter;
pub mod matchers;
pub mod normalize;
pub mod rest;
pub mod typecheck;

// Re-export commonly used types
pub use ast::AstChecker;
pub use config::{CallOrder, CheckerConfig, ThrottleRule, DEFAULT_REAL_TIME_TOLERANCE};
pub use dialect::{dialect_for, CanonicalType, ConversionError, Dialect};
pub use exec::{ExecutableChecker, ResultMatch};
pub use interpreter::{evaluate, ExecError, FunctionLibrary, HelperError};
pub use rest::{ReqwestTransport, RestChecker, RestError, RestRequest, RestResponse, RestTransport};

use callcheck_core::Value;

/// Python repr of a string, as verdict messages quote names and values.
pub(crate) fn quoted(text: &str) -> String {
    Value::from(text).to_string()
}

/// Python repr of a list of values.
pub(crate) fn listed(values: &[Value]) -> String {
    Value::List(values.to_vec()).to_string()
}
