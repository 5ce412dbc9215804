//! Registry of helper functions a candidate expression may call.
//!
//! A [`FunctionLibrary`] maps names to helpers. Each helper declares its
//! parameter names; [`FunctionLibrary::call`] binds positional and keyword
//! arguments to those names the way Python does before invoking it. Helpers
//! read their bound arguments through the accessors in this module.

use std::collections::HashMap;
use std::fmt;

use callcheck_core::{CallArgs, Value};

use super::error::{ExecError, HelperError};

type HelperFn = dyn Fn(&CallArgs) -> Result<Value, HelperError> + Send + Sync;

struct Helper {
    params: Vec<String>,
    func: Box<HelperFn>,
}

/// Named helpers available to evaluated expressions.
#[derive(Default)]
pub struct FunctionLibrary {
    helpers: HashMap<String, Helper>,
}

impl fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionLibrary").field("helpers", &names).finish()
    }
}

impl FunctionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `func` under `name`, replacing any earlier helper.
    pub fn register<F>(&mut self, name: impl Into<String>, params: &[&str], func: F) -> &mut Self
    where
        F: Fn(&CallArgs) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.helpers.insert(
            name.into(),
            Helper {
                params: params.iter().map(|p| p.to_string()).collect(),
                func: Box::new(func),
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// Binds arguments to the helper's parameters and invokes it.
    pub fn call(
        &self,
        name: &str,
        positional: Vec<Value>,
        keywords: Vec<(String, Value)>,
    ) -> Result<Value, ExecError> {
        let helper = self
            .helpers
            .get(name)
            .ok_or_else(|| ExecError::UnknownFunction {
                name: name.to_string(),
            })?;

        if positional.len() > helper.params.len() {
            return Err(ExecError::TooManyArguments {
                function: name.to_string(),
                expected: helper.params.len(),
                found: positional.len(),
            });
        }

        let mut bound = CallArgs::new();
        for (param, value) in helper.params.iter().zip(positional) {
            bound.insert(param.clone(), value);
        }
        for (key, value) in keywords {
            if !helper.params.contains(&key) {
                return Err(ExecError::UnexpectedArgument {
                    function: name.to_string(),
                    name: key,
                });
            }
            if bound.contains_key(&key) {
                return Err(ExecError::DuplicateArgument {
                    function: name.to_string(),
                    name: key,
                });
            }
            bound.insert(key, value);
        }

        tracing::trace!(function = name, args = bound.len(), "calling helper");
        (helper.func)(&bound).map_err(|source| ExecError::Helper {
            function: name.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Argument accessors
// ---------------------------------------------------------------------------

/// The bound value of a required argument.
pub fn arg<'a>(args: &'a CallArgs, name: &str) -> Result<&'a Value, HelperError> {
    args.get(name).ok_or_else(|| HelperError::MissingArgument {
        name: name.to_string(),
    })
}

/// A numeric argument (int or float) as `f64`.
pub fn number(args: &CallArgs, name: &str) -> Result<f64, HelperError> {
    let value = arg(args, name)?;
    value.as_f64().ok_or_else(|| invalid(name, "a number", value))
}

/// An integer argument. Booleans are rejected.
pub fn integer(args: &CallArgs, name: &str) -> Result<i64, HelperError> {
    match arg(args, name)? {
        Value::Int(i) => Ok(*i),
        other => Err(invalid(name, "an integer", other)),
    }
}

pub fn text<'a>(args: &'a CallArgs, name: &str) -> Result<&'a str, HelperError> {
    let value = arg(args, name)?;
    value.as_str().ok_or_else(|| invalid(name, "a string", value))
}

/// A sequence of numbers.
pub fn numbers(args: &CallArgs, name: &str) -> Result<Vec<f64>, HelperError> {
    let value = arg(args, name)?;
    let items = value
        .as_sequence()
        .ok_or_else(|| invalid(name, "a list of numbers", value))?;
    items
        .iter()
        .map(|item| item.as_f64().ok_or_else(|| invalid(name, "a list of numbers", value)))
        .collect()
}

/// A sequence of sequences of numbers.
pub fn matrix(args: &CallArgs, name: &str) -> Result<Vec<Vec<f64>>, HelperError> {
    let value = arg(args, name)?;
    let bad = || invalid(name, "a matrix of numbers", value);
    value
        .as_sequence()
        .ok_or_else(bad)?
        .iter()
        .map(|row| {
            row.as_sequence()
                .ok_or_else(bad)?
                .iter()
                .map(|cell| cell.as_f64().ok_or_else(bad))
                .collect()
        })
        .collect()
}

fn invalid(name: &str, expected: &str, found: &Value) -> HelperError {
    HelperError::InvalidArgument {
        name: name.to_string(),
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}
