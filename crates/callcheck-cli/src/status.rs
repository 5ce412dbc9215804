//! Health check of the APIs behind the executable categories.
//!
//! Ground-truth calls are run with known-good expectations. Failures mean the
//! API itself drifted or is down, which bounds how far executable scores
//! can be trusted. Executable records are compared in sanity mode, so dict
//! results only need the right number of entries.

use callcheck_check::{
    CheckerConfig, ExecutableChecker, FunctionLibrary, ResultMatch, RestChecker, RestTransport,
};
use callcheck_core::{ErrorType, TestCategory, Value, Verdict};
use serde::{Deserialize, Deserializer, Serialize};

/// One ground-truth call with its recorded result.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRecord {
    #[serde(default, deserialize_with = "one_or_many_calls")]
    pub ground_truth: Vec<String>,
    #[serde(default)]
    pub execution_result: Vec<serde_json::Value>,
    #[serde(default)]
    pub execution_result_type: Vec<ResultMatch>,
}

fn one_or_many_calls<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(call) => vec![call],
        OneOrMany::Many(calls) => calls,
    })
}

/// A ground-truth call that did not reproduce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiFailure {
    pub call: String,
    pub error_type: ErrorType,
}

/// Outcome of one group of status records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiStatus {
    pub checked: usize,
    pub failures: Vec<ApiFailure>,
}

impl ApiStatus {
    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty()
    }

    /// `"failed / checked"`, as printed in the report.
    pub fn error_rate(&self) -> String {
        format!("{} / {}", self.failures.len(), self.checked)
    }

    fn record(&mut self, call: &str, verdict: Verdict) {
        self.checked += 1;
        if let Some(error_type) = verdict.error_type() {
            tracing::debug!(call, %error_type, "api unhealthy");
            self.failures.push(ApiFailure {
                call: call.to_string(),
                error_type,
            });
        }
    }
}

/// Runs the first ground-truth call of each record and compares it with
/// the first recorded result in sanity mode.
pub fn check_executable_apis(
    records: &[StatusRecord],
    library: &FunctionLibrary,
    config: &CheckerConfig,
) -> ApiStatus {
    let checker = ExecutableChecker::new(library, TestCategory::ExecutableSimple, config);
    let mut status = ApiStatus::default();
    for record in records {
        let call = record.ground_truth.first().map(String::as_str).unwrap_or_default();
        let verdict = match (record.execution_result.first(), record.execution_result_type.first()) {
            (Some(expected), Some(criterion)) if !call.is_empty() => {
                checker.check_simple(call, &Value::from(expected.clone()), *criterion, true)
            }
            _ => incomplete_record(),
        };
        status.record(call, verdict);
    }
    status
}

/// Issues the ground-truth request of each record and compares the
/// response shape with the first recorded result.
pub fn check_rest_apis<T: RestTransport>(
    records: &[StatusRecord],
    transport: &T,
    config: &CheckerConfig,
) -> ApiStatus {
    let checker = RestChecker::new(transport, config);
    let mut status = ApiStatus::default();
    for record in records {
        let call = record.ground_truth.first().map(String::as_str).unwrap_or_default();
        let verdict = match record.execution_result.first() {
            Some(expected) if !call.is_empty() => checker.run(call, expected),
            _ => incomplete_record(),
        };
        status.record(call, verdict);
    }
    status
}

fn incomplete_record() -> Verdict {
    Verdict::invalid(
        ErrorType::ExecExpectationMismatch,
        "Status record lacks a call, a result or a match criterion.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use callcheck_check::{RestError, RestRequest, RestResponse};
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<StatusRecord> {
        serde_json::from_value(value).unwrap()
    }

    struct CannedTransport(serde_json::Value);

    impl RestTransport for CannedTransport {
        fn get(&self, _request: &RestRequest) -> Result<RestResponse, RestError> {
            Ok(RestResponse {
                status: 200,
                body: self.0.to_string(),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Executable APIs
    // -----------------------------------------------------------------------

    #[test]
    fn executable_ground_truth_is_rerun() {
        let records = records(json!([
            {
                "ground_truth": ["calculate_triangle_area(base=4, height=3)"],
                "execution_result": [6.0],
                "execution_result_type": ["exact_match"]
            },
            {
                "ground_truth": "math_gcd(12, 8)",
                "execution_result": [3],
                "execution_result_type": ["exact_match"]
            },
            {"ground_truth": ["math_gcd(12, 8)"]}
        ]));
        let library = FunctionLibrary::with_defaults();
        let status = check_executable_apis(&records, &library, &CheckerConfig::default());

        assert!(!status.is_healthy());
        assert_eq!(status.error_rate(), "2 / 3");
        assert_eq!(
            status.failures[0],
            ApiFailure {
                call: "math_gcd(12, 8)".into(),
                error_type: ErrorType::WrongResult
            }
        );
        assert_eq!(status.failures[1].error_type, ErrorType::ExecExpectationMismatch);
    }

    #[test]
    fn executable_dicts_are_compared_by_size() {
        let mut library = FunctionLibrary::new();
        library.register("get_quote", &["symbol"], |_| {
            Ok(Value::from(json!({"price": 101.5, "time": "10:31"})))
        });
        let records = records(json!([{
            "ground_truth": ["get_quote('AAPL')"],
            "execution_result": [{"price": 99.0, "updated": "09:00"}],
            "execution_result_type": ["structural_match"]
        }]));
        let status = check_executable_apis(&records, &library, &CheckerConfig::default());
        assert!(status.is_healthy(), "{:?}", status);
        assert_eq!(status.error_rate(), "0 / 1");
    }

    // -----------------------------------------------------------------------
    // REST APIs
    // -----------------------------------------------------------------------

    #[test]
    fn rest_ground_truth_is_requested() {
        let records = records(json!([
            {
                "ground_truth": "requests.get('https://api.example.com/time')",
                "execution_result": [{"time": "09:00", "zone": "CET"}]
            },
            {
                "ground_truth": "requests.get('https://api.example.com/date')",
                "execution_result": [{"date": "2024-01-01"}]
            }
        ]));
        let config = CheckerConfig {
            rest_throttle: Vec::new(),
            ..CheckerConfig::default()
        };
        let transport = CannedTransport(json!({"time": "12:00", "zone": "UTC"}));
        let status = check_rest_apis(&records, &transport, &config);

        assert_eq!(status.error_rate(), "1 / 2");
        assert_eq!(status.failures[0].error_type, ErrorType::RestWrongKey);
        assert_eq!(status.failures[0].call, "requests.get('https://api.example.com/date')");
    }
}
