//! Output-format validation of decoded model responses.
//!
//! Decoding raw model text happens upstream; these helpers confirm that the
//! decoded JSON has the shape a checker expects and convert it, or return
//! the decoder-stage [`Verdict`] that reporting records instead.

use callcheck_core::{CandidateCall, ErrorType, Verdict};
use serde_json::Value as Json;

const WRONG_FORMAT: &str = "Did not output in the specified format. Note: the model_result is wrapped in a string to ensure json serializability.";

/// A list whose items are all mappings.
pub fn is_function_calling_format(decoded: &Json) -> bool {
    decoded
        .as_array()
        .is_some_and(|items| items.iter().all(Json::is_object))
}

/// A non-empty list of strings.
pub fn is_executable_format(decoded: &Json) -> bool {
    decoded
        .as_array()
        .is_some_and(|items| !items.is_empty() && items.iter().all(Json::is_string))
}

/// A list holding exactly one string.
pub fn is_rest_format(decoded: &Json) -> bool {
    matches!(decoded.as_array().map(Vec::as_slice), Some([Json::String(_)]))
}

/// `[]`, `[{}]` and anything outside the function-calling format count as
/// an empty answer.
pub fn is_empty_output(decoded: &Json) -> bool {
    if !is_function_calling_format(decoded) {
        return true;
    }
    match decoded.as_array().map(Vec::as_slice) {
        Some([]) => true,
        Some([only]) => only.as_object().is_some_and(|map| map.is_empty()),
        _ => false,
    }
}

/// Relevance items pass when the model produced no usable call. `None`
/// means the decoder failed, which also passes.
pub fn check_relevance(decoded: Option<&Json>) -> Verdict {
    match decoded {
        Some(output) if !is_empty_output(output) => Verdict::invalid(
            ErrorType::RelevanceDecoderSuccess,
            "Valid syntax. Successfully decode model response when it should not.",
        ),
        _ => Verdict::Valid,
    }
}

pub fn ast_decode_failure(error: &str) -> Verdict {
    Verdict::invalid(
        ErrorType::AstDecoderFailed,
        format!("Invalid syntax. Failed to decode AST. {}", error),
    )
}

pub fn executable_decode_failure(error: &str) -> Verdict {
    Verdict::invalid(
        ErrorType::ExecDecoderFailed,
        format!("Failed to decode executable. {}", error),
    )
}

/// Converts decoded output into calls for the structural checker.
pub fn ast_calls(decoded: &Json) -> Result<Vec<CandidateCall>, Verdict> {
    let wrong_format = || {
        Verdict::invalid(
            ErrorType::AstDecoderFormat,
            "Did not output in the specified format. Note: the model_response is wrapped in a string to ensure json serializability.",
        )
    };
    if !is_function_calling_format(decoded) {
        return Err(wrong_format());
    }
    serde_json::from_value(decoded.clone()).map_err(|err| {
        tracing::debug!(error = %err, "function calls did not deserialize");
        wrong_format()
    })
}

/// Converts decoded output into call expressions for the executable checker.
pub fn executable_calls(decoded: &Json) -> Result<Vec<String>, Verdict> {
    if !is_executable_format(decoded) {
        return Err(Verdict::invalid(ErrorType::ExecDecoderFormat, WRONG_FORMAT));
    }
    Ok(strings(decoded))
}

/// Extracts the single call expression of a REST item.
pub fn rest_call(decoded: &Json) -> Result<String, Verdict> {
    if !is_rest_format(decoded) {
        return Err(Verdict::invalid(ErrorType::RestDecoderFormat, WRONG_FORMAT));
    }
    Ok(strings(decoded).remove(0))
}

fn strings(decoded: &Json) -> Vec<String> {
    decoded
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_predicates() {
        assert!(is_function_calling_format(&json!([])));
        assert!(is_function_calling_format(&json!([{"f": {}}])));
        assert!(!is_function_calling_format(&json!([{"f": {}}, "g()"])));
        assert!(!is_function_calling_format(&json!({"f": {}})));

        assert!(is_executable_format(&json!(["f(1)", "g(2)"])));
        assert!(!is_executable_format(&json!([])));
        assert!(!is_executable_format(&json!(["f(1)", 2])));

        assert!(is_rest_format(&json!(["requests.get('x')"])));
        assert!(!is_rest_format(&json!(["a", "b"])));
        assert!(!is_rest_format(&json!([1])));
    }

    #[test]
    fn empty_outputs() {
        assert!(is_empty_output(&json!([])));
        assert!(is_empty_output(&json!([{}])));
        assert!(is_empty_output(&json!("no call")));
        assert!(!is_empty_output(&json!([{}, {}])));
        assert!(!is_empty_output(&json!([{"f": {"a": 1}}])));
    }

    #[test]
    fn relevance() {
        assert!(check_relevance(None).is_valid());
        assert!(check_relevance(Some(&json!([{}]))).is_valid());
        let verdict = check_relevance(Some(&json!([{"get_weather": {"city": "Paris"}}])));
        assert_eq!(verdict.error_type(), Some(ErrorType::RelevanceDecoderSuccess));
    }

    #[test]
    fn conversions() {
        let calls = ast_calls(&json!([{"f": {"a": 1}}, {"g": {}}])).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].function_names().collect::<Vec<_>>(), vec!["f"]);

        let err = ast_calls(&json!([{"f": 1}])).unwrap_err();
        assert_eq!(err.error_type(), Some(ErrorType::AstDecoderFormat));

        assert_eq!(executable_calls(&json!(["f(1)"])).unwrap(), vec!["f(1)".to_string()]);
        assert_eq!(
            executable_calls(&json!("f(1)")).unwrap_err().error_type(),
            Some(ErrorType::ExecDecoderFormat)
        );
        assert_eq!(rest_call(&json!(["requests.get('x')"])).unwrap(), "requests.get('x')");
        assert_eq!(
            rest_call(&json!(["a", "b"])).unwrap_err().error_type(),
            Some(ErrorType::RestDecoderFormat)
        );
    }

    #[test]
    fn decoder_failures() {
        assert_eq!(
            ast_decode_failure("unexpected EOF").message(),
            Some("Invalid syntax. Failed to decode AST. unexpected EOF")
        );
        assert_eq!(
            executable_decode_failure("bad").error_type(),
            Some(ErrorType::ExecDecoderFailed)
        );
    }
}
