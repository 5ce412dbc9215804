//! Ground truth: the enumerated acceptable values for each expected call.
//!
//! Reference data stores one expected call as a single-key object:
//!
//! ```json
//! {"get_weather": {"location": ["Boston, MA", "boston,ma"], "unit": ["celsius", ""]}}
//! ```
//!
//! Each parameter maps to a list of acceptable values. The empty string in
//! that list marks the parameter as acceptable when omitted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::value::Value;

type RawExpectedCall = IndexMap<String, IndexMap<String, Value>>;

/// One expected function call with its accepted parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExpectedCall", into = "RawExpectedCall")]
pub struct ExpectedCall {
    pub name: String,
    pub params: IndexMap<String, Vec<Value>>,
}

/// All expected calls of one test item, in ground-truth order.
pub type GroundTruth = Vec<ExpectedCall>;

impl ExpectedCall {
    pub fn new(name: impl Into<String>) -> Self {
        ExpectedCall {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    /// Builder-style helper used mostly by tests and fixtures.
    pub fn with_param(mut self, name: impl Into<String>, accepted: Vec<Value>) -> Self {
        self.params.insert(name.into(), accepted);
        self
    }

    /// The accepted values for `param`, if the parameter is expected at all.
    pub fn accepted(&self, param: &str) -> Option<&[Value]> {
        self.params.get(param).map(Vec::as_slice)
    }

    /// Whether the empty-string marker allows `param` to be omitted.
    pub fn allows_absent(&self, param: &str) -> bool {
        self.accepted(param)
            .map(|values| values.iter().any(Value::is_absent_marker))
            .unwrap_or(false)
    }
}

impl TryFrom<RawExpectedCall> for ExpectedCall {
    type Error = CoreError;

    fn try_from(raw: RawExpectedCall) -> Result<Self, Self::Error> {
        if raw.len() != 1 {
            return Err(CoreError::MalformedExpectedCall { found: raw.len() });
        }
        let Some((name, params)) = raw.into_iter().next() else {
            return Err(CoreError::MalformedExpectedCall { found: 0 });
        };
        let params = params
            .into_iter()
            .map(|(param, accepted)| {
                let accepted = match accepted {
                    Value::List(values) => values,
                    // A bare value is read as a single acceptable variant.
                    other => vec![other],
                };
                (param, accepted)
            })
            .collect();
        Ok(ExpectedCall { name, params })
    }
}

impl From<ExpectedCall> for RawExpectedCall {
    fn from(call: ExpectedCall) -> Self {
        let params = call
            .params
            .into_iter()
            .map(|(param, accepted)| (param, Value::List(accepted)))
            .collect();
        let mut raw = IndexMap::new();
        raw.insert(call.name, params);
        raw
    }
}
