//! Decoded model output for structural checking.
//!
//! Decoding raw model text happens upstream. What arrives here is a mapping
//! from function name to its keyword arguments, in the same single-key shape
//! as the ground truth: `{"get_weather": {"location": "Boston"}}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Keyword arguments of one call, in the order the model supplied them.
pub type CallArgs = IndexMap<String, Value>;

/// One decoded function call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateCall {
    calls: IndexMap<String, CallArgs>,
}

impl CandidateCall {
    pub fn new(name: impl Into<String>, args: CallArgs) -> Self {
        let mut calls = IndexMap::new();
        calls.insert(name.into(), args);
        CandidateCall { calls }
    }

    /// Builds a call from `(name, value)` pairs.
    pub fn with_args<K, I>(name: impl Into<String>, args: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::new(
            name,
            args.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// Arguments supplied for function `name`, if the model called it.
    pub fn args(&self, name: &str) -> Option<&CallArgs> {
        self.calls.get(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_decoded_shape() {
        let calls: Vec<CandidateCall> = serde_json::from_value(json!([
            {"get_weather": {"location": "boston, MA", "unit": "celsius"}},
            {}
        ]))
        .unwrap();
        let args = calls[0].args("get_weather").unwrap();
        assert_eq!(args["unit"], Value::from("celsius"));
        assert!(calls[1].is_empty());
        assert!(calls[0].args("get_time").is_none());
    }

    #[test]
    fn builds_from_pairs() {
        let call = CandidateCall::with_args("f", [("x", Value::Int(1))]);
        assert_eq!(call.function_names().collect::<Vec<_>>(), vec!["f"]);
        assert_eq!(call.to_json(), json!({"f": {"x": 1}}));
    }
}
