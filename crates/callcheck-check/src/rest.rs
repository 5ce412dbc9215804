//! REST checking: issue the model's HTTP GET and compare the response shape.
//!
//! The candidate is a single `requests.get(url, params=..., headers=...)`
//! expression. Its arguments are evaluated as literals, the request goes out
//! through a [`RestTransport`], and the JSON body is compared with the
//! expected body by key sets only. Values are never compared; live APIs
//! return different data on every call.

use std::collections::BTreeSet;
use std::time::Duration;

use callcheck_core::{ErrorType, Value, Verdict};

use crate::config::CheckerConfig;
use crate::interpreter::eval::eval;
use crate::interpreter::{parse, ExecError, Expr, FunctionLibrary};

/// A GET request extracted from a candidate call.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

/// Status and raw body of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RestError {
    #[error("{0}")]
    Call(#[from] ExecError),

    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Status(String),
}

/// Sends REST requests. Tests substitute a fake.
pub trait RestTransport {
    fn get(&self, request: &RestRequest) -> Result<RestResponse, RestError>;
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, RestError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|err| RestError::Request(format!("client setup failed: {}", err)))?;
        Ok(ReqwestTransport { client })
    }
}

impl RestTransport for ReqwestTransport {
    fn get(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
        let mut req = self.client.get(&request.url).query(&request.params);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        let response = req.send().map_err(|err| RestError::Request(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| RestError::Status(format!("response read failed: {}", err)))?;
        Ok(RestResponse { status, body })
    }
}

/// Checks a REST candidate against the expected response body.
pub struct RestChecker<'a, T: RestTransport> {
    transport: &'a T,
    config: &'a CheckerConfig,
}

impl<'a, T: RestTransport> RestChecker<'a, T> {
    pub fn new(transport: &'a T, config: &'a CheckerConfig) -> Self {
        RestChecker { transport, config }
    }

    pub fn run(&self, call: &str, expected: &serde_json::Value) -> Verdict {
        let call = call.replace("requests_get", "requests.get");
        if let Some(pause) = self.config.throttle_for(&call) {
            tracing::info!(pause_ms = pause.as_millis() as u64, "throttling REST call");
            std::thread::sleep(pause);
        }

        let response = match parse_request(&call).and_then(|request| self.transport.get(&request)) {
            Ok(response) => response,
            Err(RestError::Status(message)) => {
                return Verdict::invalid(
                    ErrorType::RestCannotGetStatusCode,
                    format!("Cannot get status code of the response. Error: {}", message),
                )
            }
            Err(err) => {
                return Verdict::invalid(
                    ErrorType::RestExecutionError,
                    format!("Execution failed. {}", err),
                )
            }
        };
        tracing::debug!(status = response.status, "REST response received");

        if response.status != 200 {
            return Verdict::invalid(
                ErrorType::RestWrongStatusCode,
                format!("Execution result status code is not 200, got {}", response.status),
            );
        }

        let body: serde_json::Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(err) => return format_error(response.status, err),
        };
        compare_bodies(expected, &body, response.status)
    }
}

/// Extracts the GET request from a `requests.get(...)` expression.
pub fn parse_request(call: &str) -> Result<RestRequest, RestError> {
    let Expr::Call {
        function,
        args,
        kwargs,
    } = parse(call)?
    else {
        return Err(RestError::Request("expected a requests.get(...) call".into()));
    };
    if function != "requests.get" {
        return Err(ExecError::UnknownFunction { name: function }.into());
    }

    let literals = FunctionLibrary::new();
    let mut url = match args.first() {
        Some(expr) => Some(eval(expr, &literals)?),
        None => None,
    };
    if args.len() > 1 {
        return Err(ExecError::TooManyArguments {
            function,
            expected: 1,
            found: args.len(),
        }
        .into());
    }

    let mut request = RestRequest {
        url: String::new(),
        params: Vec::new(),
        headers: Vec::new(),
        timeout: None,
    };
    for (name, expr) in &kwargs {
        let value = eval(expr, &literals)?;
        match name.as_str() {
            "url" if url.is_some() => {
                return Err(ExecError::DuplicateArgument {
                    function,
                    name: name.clone(),
                }
                .into())
            }
            "url" => url = Some(value),
            "params" => request.params = string_pairs(name, value)?,
            "headers" => request.headers = string_pairs(name, value)?,
            "timeout" => {
                request.timeout = match value.as_f64().filter(|secs| *secs > 0.0) {
                    Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|err| {
                        RestError::Request(format!("invalid timeout {}: {}", value, err))
                    })?),
                    None => None,
                }
            }
            _ => {
                return Err(ExecError::UnexpectedArgument {
                    function,
                    name: name.clone(),
                }
                .into())
            }
        }
    }

    request.url = match url {
        Some(Value::Str(url)) => url,
        Some(other) => {
            return Err(RestError::Request(format!(
                "url must be a string, got {}",
                other.type_name()
            )))
        }
        None => return Err(RestError::Request("missing url".into())),
    };
    Ok(request)
}

fn string_pairs(name: &str, value: Value) -> Result<Vec<(String, String)>, RestError> {
    match value {
        Value::None => Ok(Vec::new()),
        Value::Dict(map) => Ok(map
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::Str(s) => s,
                    other => other.to_json().to_string(),
                };
                (key, text)
            })
            .collect()),
        other => Err(RestError::Request(format!(
            "{} must be a dict, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn compare_bodies(expected: &serde_json::Value, body: &serde_json::Value, status: u16) -> Verdict {
    use serde_json::Value as Json;

    match (expected, body) {
        (Json::Object(wanted), Json::Object(actual)) => same_keys(wanted, actual),
        (Json::Object(_), other) => wrong_type("dictionary", other),
        (Json::Array(wanted), Json::Array(actual)) => {
            if wanted.len() != actual.len() {
                return Verdict::invalid(
                    ErrorType::RestResultCount,
                    "Response list length inconsistency.",
                );
            }
            for (wanted, actual) in wanted.iter().zip(actual) {
                let (Json::Object(wanted), Json::Object(actual)) = (wanted, actual) else {
                    return Verdict::invalid(
                        ErrorType::RestResponseFormat,
                        format!(
                            "Error in execution and type checking. Status code: {}. Error: list elements must be dictionaries",
                            status
                        ),
                    );
                };
                let verdict = same_keys(wanted, actual);
                if !verdict.is_valid() {
                    return verdict;
                }
            }
            Verdict::Valid
        }
        (Json::Array(_), other) => wrong_type("list", other),
        (_, other) => wrong_type("dict or list", other),
    }
}

fn same_keys(
    wanted: &serde_json::Map<String, serde_json::Value>,
    actual: &serde_json::Map<String, serde_json::Value>,
) -> Verdict {
    let wanted: BTreeSet<&String> = wanted.keys().collect();
    let actual: BTreeSet<&String> = actual.keys().collect();
    if wanted == actual {
        Verdict::Valid
    } else {
        Verdict::invalid(ErrorType::RestWrongKey, "Key inconsistency")
    }
}

fn wrong_type(expected: &str, body: &serde_json::Value) -> Verdict {
    Verdict::invalid(
        ErrorType::RestWrongType,
        format!(
            "Expected {}, but got <class '{}'>",
            expected,
            Value::from(body.clone()).type_name()
        ),
    )
}

fn format_error(status: u16, err: serde_json::Error) -> Verdict {
    Verdict::invalid(
        ErrorType::RestResponseFormat,
        format!(
            "Error in execution and type checking. Status code: {}. Error: {}",
            status, err
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Returns a canned response and records every request.
    struct FakeTransport {
        response: Result<RestResponse, RestError>,
        seen: RefCell<Vec<RestRequest>>,
    }

    impl FakeTransport {
        fn ok(status: u16, body: serde_json::Value) -> Self {
            Self::with(Ok(RestResponse {
                status,
                body: body.to_string(),
            }))
        }

        fn with(response: Result<RestResponse, RestError>) -> Self {
            FakeTransport {
                response,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl RestTransport for FakeTransport {
        fn get(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
            self.seen.borrow_mut().push(request.clone());
            self.response.clone()
        }
    }

    fn no_throttle() -> CheckerConfig {
        CheckerConfig {
            rest_throttle: Vec::new(),
            ..CheckerConfig::default()
        }
    }

    const CALL: &str = "requests.get('https://api.example.com/v1/time', params={'tz': 'UTC', 'days': 3}, headers={'X-Key': 'abc'})";

    // -----------------------------------------------------------------------
    // Request extraction
    // -----------------------------------------------------------------------

    #[test]
    fn extracts_url_params_and_headers() {
        let request = parse_request(CALL).unwrap();
        assert_eq!(request.url, "https://api.example.com/v1/time");
        assert_eq!(
            request.params,
            vec![("tz".to_string(), "UTC".to_string()), ("days".to_string(), "3".to_string())]
        );
        assert_eq!(request.headers, vec![("X-Key".to_string(), "abc".to_string())]);

        let request = parse_request("requests.get(url='https://x.io', timeout=5)").unwrap();
        assert_eq!(request.url, "https://x.io");
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_other_calls() {
        assert!(parse_request("requests.post('https://x.io')").is_err());
        assert!(parse_request("requests.get()").is_err());
        assert!(parse_request("requests.get(42)").is_err());
        assert!(parse_request("requests.get('https://x.io', verify=False)").is_err());
        assert!(parse_request("requests.get('https://x.io', url='https://y.io')").is_err());
    }

    #[test]
    fn oversized_timeouts_are_execution_errors() {
        for call in [
            "requests.get('https://x.io', timeout=1e20)",
            "requests.get('https://x.io', timeout=1e400)",
        ] {
            assert!(matches!(parse_request(call), Err(RestError::Request(_))), "{}", call);
        }

        let config = no_throttle();
        let transport = FakeTransport::ok(200, json!({}));
        let verdict = RestChecker::new(&transport, &config)
            .run("requests.get('https://x.io', timeout=1e20)", &json!({}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestExecutionError));
        assert!(transport.seen.borrow().is_empty());
    }

    // -----------------------------------------------------------------------
    // Response comparison
    // -----------------------------------------------------------------------

    #[test]
    fn dict_bodies_compare_key_sets() {
        let config = no_throttle();
        let transport = FakeTransport::ok(200, json!({"time": "12:00", "tz": "UTC"}));
        let checker = RestChecker::new(&transport, &config);
        assert!(checker.run(CALL, &json!({"tz": "CET", "time": "13:00"})).is_valid());

        let verdict = checker.run(CALL, &json!({"time": "13:00"}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestWrongKey));
        assert_eq!(verdict.message(), Some("Key inconsistency"));

        let verdict = checker.run(CALL, &json!([{"time": 1}]));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestWrongType));
        assert_eq!(verdict.message(), Some("Expected list, but got <class 'dict'>"));
    }

    #[test]
    fn list_bodies_compare_length_then_keys() {
        let config = no_throttle();
        let transport = FakeTransport::ok(200, json!([{"a": 1}, {"a": 2, "b": 3}]));
        let checker = RestChecker::new(&transport, &config);
        assert!(checker.run(CALL, &json!([{"a": 0}, {"b": 0, "a": 0}])).is_valid());
        assert_eq!(
            checker.run(CALL, &json!([{"a": 0}])).error_type(),
            Some(ErrorType::RestResultCount)
        );
        assert_eq!(
            checker.run(CALL, &json!([{"a": 0}, {"a": 0}])).error_type(),
            Some(ErrorType::RestWrongKey)
        );
    }

    #[test]
    fn rewrites_underscore_alias() {
        let config = no_throttle();
        let transport = FakeTransport::ok(200, json!({}));
        let checker = RestChecker::new(&transport, &config);
        assert!(checker.run("requests_get('https://x.io')", &json!({})).is_valid());
        assert_eq!(transport.seen.borrow()[0].url, "https://x.io");
    }

    // -----------------------------------------------------------------------
    // Failure stages
    // -----------------------------------------------------------------------

    #[test]
    fn failure_stages_have_distinct_tags() {
        let config = no_throttle();

        let transport = FakeTransport::ok(404, json!({}));
        let verdict = RestChecker::new(&transport, &config).run(CALL, &json!({}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestWrongStatusCode));
        assert_eq!(verdict.message(), Some("Execution result status code is not 200, got 404"));

        let transport = FakeTransport::with(Ok(RestResponse {
            status: 200,
            body: "<html>".into(),
        }));
        let verdict = RestChecker::new(&transport, &config).run(CALL, &json!({}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestResponseFormat));

        let transport = FakeTransport::with(Err(RestError::Request("connection refused".into())));
        let verdict = RestChecker::new(&transport, &config).run(CALL, &json!({}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestExecutionError));
        assert_eq!(verdict.message(), Some("Execution failed. connection refused"));

        let transport = FakeTransport::with(Err(RestError::Status("reset".into())));
        let verdict = RestChecker::new(&transport, &config).run(CALL, &json!({}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestCannotGetStatusCode));

        let transport = FakeTransport::ok(200, json!({}));
        let verdict = RestChecker::new(&transport, &config).run("requests.get(", &json!({}));
        assert_eq!(verdict.error_type(), Some(ErrorType::RestExecutionError));
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn scalar_expectations_are_wrong_type() {
        let config = no_throttle();
        let transport = FakeTransport::ok(200, json!("text"));
        let verdict = RestChecker::new(&transport, &config).run(CALL, &json!(1));
        assert_eq!(verdict.message(), Some("Expected dict or list, but got <class 'str'>"));
    }
}
