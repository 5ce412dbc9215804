//! JSON Lines inputs: test items, possible answers and model responses.
//!
//! All three files of a category are aligned by line. Model output arrives
//! already decoded; a response without a `decoded` value is a decoder
//! failure and `decode_error` says why.

use std::fs;
use std::path::Path;

use callcheck_check::ResultMatch;
use callcheck_core::schema::one_or_many;
use callcheck_core::{FunctionSchema, GroundTruth};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CliError;

/// One benchmark question.
#[derive(Debug, Clone, Deserialize)]
pub struct TestItem {
    pub id: String,
    #[serde(default)]
    pub question: serde_json::Value,
    #[serde(default, deserialize_with = "one_or_many")]
    pub function: Vec<FunctionSchema>,
    /// Expected results of executable and REST items.
    #[serde(default)]
    pub execution_result: Vec<serde_json::Value>,
    #[serde(default)]
    pub execution_result_type: Vec<ResultMatch>,
}

/// Ground truth for one AST item.
#[derive(Debug, Clone, Deserialize)]
pub struct PossibleAnswer {
    #[serde(default)]
    pub id: Option<String>,
    pub ground_truth: GroundTruth,
}

/// One model response.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub id: Option<String>,
    /// Raw model output, kept for failure reports.
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub decoded: Option<serde_json::Value>,
    #[serde(default)]
    pub decode_error: Option<String>,
}

impl ModelResponse {
    pub fn decode_error(&self) -> &str {
        self.decode_error.as_deref().unwrap_or("no decoded output")
    }
}

/// Reads a JSON Lines file. Blank lines are skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| CliError::JsonLine {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect::<Result<Vec<T>, CliError>>()?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn reads_items_with_single_or_many_functions() {
        let file = write_lines(&[
            r#"{"id": "simple_0", "question": "Weather?", "function": {"name": "get_weather", "parameters": {"properties": {}}}}"#,
            "",
            r#"{"id": "exec_0", "question": "Area?", "function": [{"name": "a"}, {"name": "b"}], "execution_result": [25], "execution_result_type": ["exact_match"]}"#,
        ]);
        let items: Vec<TestItem> = read_jsonl(file.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].function.len(), 1);
        assert_eq!(items[1].function.len(), 2);
        assert_eq!(items[1].execution_result_type, vec![ResultMatch::ExactMatch]);
    }

    #[test]
    fn reports_the_failing_line() {
        let file = write_lines(&[r#"{"id": "a", "ground_truth": []}"#, "{oops"]);
        let err = read_jsonl::<PossibleAnswer>(file.path()).unwrap_err();
        assert!(matches!(err, CliError::JsonLine { line: 2, .. }));
    }

    #[test]
    fn responses_without_decoded_output_carry_a_reason() {
        let file = write_lines(&[
            r#"{"id": "r0", "result": "[get_weather(city='Paris')]", "decoded": [{"get_weather": {"city": "Paris"}}]}"#,
            r#"{"id": "r1", "result": "I cannot help", "decode_error": "invalid syntax"}"#,
            r#"{"id": "r2", "result": "?"}"#,
        ]);
        let responses: Vec<ModelResponse> = read_jsonl(file.path()).unwrap();
        assert!(responses[0].decoded.is_some());
        assert_eq!(responses[1].decode_error(), "invalid syntax");
        assert_eq!(responses[2].decode_error(), "no decoded output");
    }
}
