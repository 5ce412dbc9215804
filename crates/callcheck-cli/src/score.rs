//! Accuracy bookkeeping and score files.
//!
//! A score file is JSON Lines: a [`CategoryScore`] summary on the first line,
//! then one [`FailureRecord`] per failed item.

use std::fs;
use std::io::Write;
use std::path::Path;

use callcheck_core::{ErrorType, FailureMessage, FunctionSchema, TestCategory, Value, Verdict};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Accuracy over one category, or an aggregate of several.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    pub accuracy: f64,
    #[serde(default)]
    pub correct_count: usize,
    pub total_count: usize,
}

impl CategoryScore {
    pub fn new(correct_count: usize, total_count: usize) -> Self {
        let accuracy = if total_count > 0 {
            correct_count as f64 / total_count as f64
        } else {
            0.0
        };
        CategoryScore {
            accuracy,
            correct_count,
            total_count,
        }
    }
}

/// Accuracy weighted by item count. Empty input scores zero.
pub fn weighted_accuracy(scores: &[CategoryScore]) -> CategoryScore {
    let total_count: usize = scores.iter().map(|s| s.total_count).sum();
    if total_count == 0 {
        return CategoryScore::default();
    }
    let weighted: f64 = scores.iter().map(|s| s.accuracy * s.total_count as f64).sum();
    CategoryScore {
        accuracy: weighted / total_count as f64,
        correct_count: scores.iter().map(|s| s.correct_count).sum(),
        total_count,
    }
}

/// Plain mean of accuracies. The aggregate carries no item count.
pub fn unweighted_accuracy(scores: &[CategoryScore]) -> CategoryScore {
    if scores.is_empty() {
        return CategoryScore::default();
    }
    CategoryScore {
        accuracy: scores.iter().map(|s| s.accuracy).sum::<f64>() / scores.len() as f64,
        correct_count: 0,
        total_count: 0,
    }
}

/// One failed item as written to the score file.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub id: String,
    pub test_category: TestCategory,
    pub model_name: String,
    pub is_valid: bool,
    pub error_type: ErrorType,
    pub error_message: FailureMessage,
    pub question: serde_json::Value,
    pub func_doc: Vec<FunctionSchema>,
    pub model_response_raw: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_response_decoded: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_answer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_executed_output: Option<Value>,
}

impl FailureRecord {
    /// Builds a record from a failed verdict; `None` for `Verdict::Valid`.
    pub fn from_verdict(
        verdict: Verdict,
        id: &str,
        category: TestCategory,
        model_name: &str,
    ) -> Option<Self> {
        let Verdict::Invalid(failure) = verdict else {
            return None;
        };
        let failure = *failure;
        Some(FailureRecord {
            id: id.to_string(),
            test_category: category,
            model_name: model_name.to_string(),
            is_valid: false,
            error_type: failure.error_type,
            error_message: failure.message,
            question: serde_json::Value::Null,
            func_doc: Vec::new(),
            model_response_raw: serde_json::Value::Null,
            model_response_decoded: None,
            possible_answer: None,
            model_executed_output: failure.execution_output,
        })
    }
}

/// Writes a score file, replacing any previous one.
pub fn write_score_file(
    path: &Path,
    score: &CategoryScore,
    failures: &[FailureRecord],
) -> Result<(), CliError> {
    let write_err = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut out = Vec::new();
    let lines = std::iter::once(serde_json::to_string(score))
        .chain(failures.iter().map(serde_json::to_string));
    for line in lines {
        let line = line.map_err(|err| write_err(std::io::Error::other(err)))?;
        writeln!(out, "{}", line).map_err(write_err)?;
    }
    fs::write(path, out).map_err(write_err)
}

/// Reads the summary line of a score file.
pub fn read_score_summary(path: &Path) -> Result<CategoryScore, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let first = text.lines().next().unwrap_or_default();
    serde_json::from_str(first).map_err(|source| CliError::JsonLine {
        path: path.to_path_buf(),
        line: 1,
        source,
    })
}

/// Headline numbers for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub model_name: String,
    pub overall: CategoryScore,
    pub ast_summary: CategoryScore,
    pub exec_summary: CategoryScore,
    pub categories: IndexMap<TestCategory, CategoryScore>,
}

/// Per-model, per-category scores.
///
/// Written by a single driver thread; it is never shared while checking.
#[derive(Debug, Default)]
pub struct Leaderboard {
    table: IndexMap<String, IndexMap<TestCategory, CategoryScore>>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a category score. A score already recorded is kept.
    pub fn record(&mut self, model_name: &str, category: TestCategory, score: CategoryScore) {
        self.table
            .entry(model_name.to_string())
            .or_default()
            .entry(category)
            .or_insert(score);
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Combines category scores into the leaderboard's headline columns.
    ///
    /// The simple columns pool languages (AST) and REST (executable) by item
    /// count; the summaries average the four call shapes; the overall score
    /// weights every column, relevance included, by item count.
    pub fn summary(&self, model_name: &str) -> Option<ModelSummary> {
        use TestCategory::*;

        let scores = self.table.get(model_name)?;
        let get = |category| scores.get(&category).copied().unwrap_or_default();

        let simple_ast = weighted_accuracy(&[get(Simple), get(Java), get(Javascript)]);
        let simple_exec = weighted_accuracy(&[get(ExecutableSimple), get(Rest)]);
        let ast = [
            simple_ast,
            get(MultipleFunction),
            get(ParallelFunction),
            get(ParallelMultipleFunction),
        ];
        let exec = [
            simple_exec,
            get(ExecutableMultipleFunction),
            get(ExecutableParallelFunction),
            get(ExecutableParallelMultipleFunction),
        ];
        let mut everything: Vec<CategoryScore> = ast.iter().chain(&exec).copied().collect();
        everything.push(get(Relevance));

        Some(ModelSummary {
            model_name: model_name.to_string(),
            overall: weighted_accuracy(&everything),
            ast_summary: unweighted_accuracy(&ast),
            exec_summary: unweighted_accuracy(&exec),
            categories: scores.clone(),
        })
    }
}
