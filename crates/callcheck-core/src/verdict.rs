//! Verdicts: the single output type of every matcher and checker.
//!
//! A [`Verdict`] is either [`Verdict::Valid`] or carries a [`Failure`] whose
//! [`ErrorType`] follows the stable `<stage>:<reason>` tag convention used by
//! reporting. Order-free searches that exhaust every candidate report a
//! [`DiagnosticList`] with one [`Attempt`] per rejected pairing instead of a
//! plain message.
//!
//! Serialization keeps the historical report shape:
//! `{"is_valid": false, "error_type": "...", "error_message": ...}`.

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::value::Value;

/// Stable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    // Single-call structural checks
    WrongCount,
    WrongFuncName,
    MissingRequired,
    UnexpectedParam,
    MissingOptional,
    UnknownType,
    MissingDescription,

    // Type checks
    TypeSimple,
    TypeNested,
    TypeJava,
    TypeJavaScript,

    // Value checks
    ValueString,
    ValueListTuple,
    DictItems,
    DictKey,
    DictValue,
    DictUnclear,
    ListDictCount,
    ListDictUnclear,
    ValueOthers,

    // Multi-call structural checks
    EnforceOrderWrongCount,
    EnforceOrderMissingDescription,
    NoOrderWrongCount,
    NoOrderMissingDescription,
    NoOrderNoMatch,

    // Executable checks
    ExecWrongCount,
    ExecResultCount,
    ExecExpectationMismatch,
    ExecutionError,
    WrongResult,
    WrongResultRealTime,
    WrongResultType,
    WrongResultDictLength,
    WrongResultDictKeyNotFound,
    WrongResultDictExtraKey,
    WrongResultListLength,
    ExecNoMatch,

    // REST checks
    RestExecutionError,
    RestWrongStatusCode,
    RestCannotGetStatusCode,
    RestResponseFormat,
    RestWrongKey,
    RestWrongType,
    RestResultCount,

    // Output format and relevance
    AstDecoderFailed,
    AstDecoderFormat,
    ExecDecoderFailed,
    ExecDecoderFormat,
    RestDecoderFormat,
    RelevanceDecoderSuccess,
}

impl ErrorType {
    /// The stable tag string used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::WrongCount => "simple_function_checker:wrong_count",
            ErrorType::WrongFuncName => "simple_function_checker:wrong_func_name",
            ErrorType::MissingRequired => "simple_function_checker:missing_required",
            ErrorType::UnexpectedParam => "simple_function_checker:unexpected_param",
            ErrorType::MissingOptional => "simple_function_checker:missing_optional",
            ErrorType::UnknownType => "simple_function_checker:unknown_type",
            ErrorType::MissingDescription => "simple_function_checker:cannot_find_description",
            ErrorType::TypeSimple => "type_error:simple",
            ErrorType::TypeNested => "type_error:nested",
            ErrorType::TypeJava => "type_error:java",
            ErrorType::TypeJavaScript => "type_error:js",
            ErrorType::ValueString => "value_error:string",
            ErrorType::ValueListTuple => "value_error:list/tuple",
            ErrorType::DictItems => "value_error:dict_items",
            ErrorType::DictKey => "value_error:dict_key",
            ErrorType::DictValue => "value_error:dict_value",
            ErrorType::DictUnclear => "dict_checker:unclear",
            ErrorType::ListDictCount => "value_error:list_dict_count",
            ErrorType::ListDictUnclear => "list_dict_checker:unclear",
            ErrorType::ValueOthers => "value_error:others",
            ErrorType::EnforceOrderWrongCount => {
                "parallel_function_checker_enforce_order:wrong_count"
            }
            ErrorType::EnforceOrderMissingDescription => {
                "parallel_function_checker_enforce_order:cannot_find_description"
            }
            ErrorType::NoOrderWrongCount => "parallel_function_checker_no_order:wrong_count",
            ErrorType::NoOrderMissingDescription => {
                "parallel_function_checker_no_order:cannot_find_description"
            }
            ErrorType::NoOrderNoMatch => "parallel_function_checker_no_order:cannot_find_match",
            ErrorType::ExecWrongCount => "simple_exec_checker:wrong_count",
            ErrorType::ExecResultCount => "value_error:exec_result_count",
            ErrorType::ExecExpectationMismatch => "executable_checker:expected_result_mismatch",
            ErrorType::ExecutionError => "executable_checker:execution_error",
            ErrorType::WrongResult => "executable_checker:wrong_result",
            ErrorType::WrongResultRealTime => "executable_checker:wrong_result_real_time",
            ErrorType::WrongResultType => "executable_checker:wrong_result_type",
            ErrorType::WrongResultDictLength => "executable_checker:wrong_result_type:dict_length",
            ErrorType::WrongResultDictKeyNotFound => {
                "executable_checker:wrong_result_type:dict_key_not_found"
            }
            ErrorType::WrongResultDictExtraKey => {
                "executable_checker:wrong_result_type:dict_extra_key"
            }
            ErrorType::WrongResultListLength => "executable_checker:wrong_result_type:list_length",
            ErrorType::ExecNoMatch => "executable_checker:cannot_find_match",
            ErrorType::RestExecutionError => "executable_checker_rest:execution_error",
            ErrorType::RestWrongStatusCode => "executable_checker_rest:wrong_status_code",
            ErrorType::RestCannotGetStatusCode => "executable_checker_rest:cannot_get_status_code",
            ErrorType::RestResponseFormat => "executable_checker_rest:response_format_error",
            ErrorType::RestWrongKey => "executable_checker_rest:wrong_key",
            ErrorType::RestWrongType => "executable_checker_rest:wrong_type",
            ErrorType::RestResultCount => "value_error:exec_result_rest_count",
            ErrorType::AstDecoderFailed => "ast_decoder:decoder_failed",
            ErrorType::AstDecoderFormat => "ast_decoder:decoder_wrong_output_format",
            ErrorType::ExecDecoderFailed => "executable_decoder:decoder_failed",
            ErrorType::ExecDecoderFormat => "executable_decoder:wrong_output_format",
            ErrorType::RestDecoderFormat => "executable_decoder:rest_wrong_output_format",
            ErrorType::RelevanceDecoderSuccess => "relevance_error:decoder_success",
        }
    }

    /// The `<stage>` half of the tag.
    pub fn stage(self) -> &'static str {
        self.as_str().split(':').next().unwrap_or_default()
    }

    /// Whether the failure signals corrupt benchmark data rather than a bad
    /// candidate.
    pub fn is_data_integrity(self) -> bool {
        matches!(
            self,
            ErrorType::UnknownType
                | ErrorType::MissingDescription
                | ErrorType::EnforceOrderMissingDescription
                | ErrorType::NoOrderMissingDescription
                | ErrorType::ExecExpectationMismatch
        )
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The outcome of checking one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid,
    Invalid(Box<Failure>),
}

/// Details of a failed check.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error_type: ErrorType,
    pub message: FailureMessage,
    /// The value the candidate produced, for executable checks.
    pub execution_output: Option<Value>,
}

/// Either a single human-readable message or the full record of an
/// exhausted order-free search.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureMessage {
    Text(String),
    Diagnostics(DiagnosticList),
}

/// Every rejected pairing observed while searching for a match.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticList {
    pub summary: String,
    pub attempts: Vec<Attempt>,
}

/// One candidate tried against one expected call or result.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub candidate_index: usize,
    pub error_type: ErrorType,
    pub message: String,
    pub candidate: Option<serde_json::Value>,
    pub expected: Option<serde_json::Value>,
    pub execution_output: Option<Value>,
}

impl Verdict {
    pub fn invalid(error_type: ErrorType, message: impl Into<String>) -> Self {
        Verdict::Invalid(Box::new(Failure {
            error_type,
            message: FailureMessage::Text(message.into()),
            execution_output: None,
        }))
    }

    pub fn diagnostics(error_type: ErrorType, diagnostics: DiagnosticList) -> Self {
        Verdict::Invalid(Box::new(Failure {
            error_type,
            message: FailureMessage::Diagnostics(diagnostics),
            execution_output: None,
        }))
    }

    /// Attaches the produced value to a failure. No-op on `Valid`.
    pub fn with_output(mut self, output: Value) -> Self {
        if let Verdict::Invalid(failure) = &mut self {
            failure.execution_output = Some(output);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid(failure) => Some(failure),
        }
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        self.failure().map(|failure| failure.error_type)
    }

    /// The failure text; for diagnostics, the search summary.
    pub fn message(&self) -> Option<&str> {
        self.failure().map(|failure| match &failure.message {
            FailureMessage::Text(text) => text.as_str(),
            FailureMessage::Diagnostics(list) => list.summary.as_str(),
        })
    }

    pub fn execution_output(&self) -> Option<&Value> {
        self.failure().and_then(|failure| failure.execution_output.as_ref())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => f.write_str("valid"),
            Verdict::Invalid(failure) => match &failure.message {
                FailureMessage::Text(text) => write!(f, "{}: {}", failure.error_type, text),
                FailureMessage::Diagnostics(list) => write!(
                    f,
                    "{}: {} ({} rejected attempt(s))",
                    failure.error_type,
                    list.summary,
                    list.attempts.len()
                ),
            },
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Verdict::Valid => {
                let mut state = serializer.serialize_struct("Verdict", 1)?;
                state.serialize_field("is_valid", &true)?;
                state.end()
            }
            Verdict::Invalid(failure) => {
                let len = if failure.execution_output.is_some() { 4 } else { 3 };
                let mut state = serializer.serialize_struct("Verdict", len)?;
                state.serialize_field("is_valid", &false)?;
                state.serialize_field("error_type", &failure.error_type)?;
                state.serialize_field("error_message", &failure.message)?;
                if let Some(output) = &failure.execution_output {
                    state.serialize_field("execution_output", output)?;
                }
                state.end()
            }
        }
    }
}

impl Serialize for FailureMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FailureMessage::Text(text) => serializer.serialize_str(text),
            FailureMessage::Diagnostics(list) => list.serialize(serializer),
        }
    }
}

impl Serialize for DiagnosticList {
    /// Serialized as `[summary, {"Model Result Index i": {...}}, ...]`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.attempts.len() + 1))?;
        seq.serialize_element(&self.summary)?;
        for attempt in &self.attempts {
            seq.serialize_element(attempt)?;
        }
        seq.end()
    }
}

#[derive(Serialize)]
struct AttemptBody<'a> {
    sub_error: &'a str,
    sub_error_type: ErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_output_item: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    possible_answer_item: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_executed_output: Option<&'a Value>,
}

impl Serialize for Attempt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &format!("Model Result Index {}", self.candidate_index),
            &AttemptBody {
                sub_error: &self.message,
                sub_error_type: self.error_type,
                model_output_item: self.candidate.as_ref(),
                possible_answer_item: self.expected.as_ref(),
                model_executed_output: self.execution_output.as_ref(),
            },
        )?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_serializes_minimally() {
        assert_eq!(serde_json::to_value(Verdict::Valid).unwrap(), json!({"is_valid": true}));
    }

    #[test]
    fn text_failures_keep_report_shape() {
        let verdict = Verdict::invalid(ErrorType::MissingRequired, "Missing required parameter: 'location'.");
        assert_eq!(
            serde_json::to_value(&verdict).unwrap(),
            json!({
                "is_valid": false,
                "error_type": "simple_function_checker:missing_required",
                "error_message": "Missing required parameter: 'location'."
            })
        );
        insta::assert_snapshot!(
            verdict.to_string(),
            @"simple_function_checker:missing_required: Missing required parameter: 'location'."
        );
    }

    #[test]
    fn diagnostics_serialize_as_list() {
        let verdict = Verdict::diagnostics(
            ErrorType::NoOrderNoMatch,
            DiagnosticList {
                summary: "no match".into(),
                attempts: vec![Attempt {
                    candidate_index: 1,
                    error_type: ErrorType::ValueString,
                    message: "bad".into(),
                    candidate: Some(json!({"f": {}})),
                    expected: None,
                    execution_output: None,
                }],
            },
        );
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["error_message"][0], json!("no match"));
        assert_eq!(
            json["error_message"][1]["Model Result Index 1"]["sub_error_type"],
            json!("value_error:string")
        );
        assert_eq!(verdict.message(), Some("no match"));
    }

    #[test]
    fn execution_output_is_attached_to_failures_only() {
        let failed = Verdict::invalid(ErrorType::WrongResult, "x").with_output(Value::Int(3));
        assert_eq!(failed.execution_output(), Some(&Value::Int(3)));
        assert_eq!(Verdict::Valid.with_output(Value::Int(3)).execution_output(), None);
    }

    #[test]
    fn data_integrity_tags_are_distinguished() {
        assert!(ErrorType::NoOrderMissingDescription.is_data_integrity());
        assert!(!ErrorType::NoOrderWrongCount.is_data_integrity());
        assert_eq!(ErrorType::TypeJavaScript.stage(), "type_error");
    }
}
