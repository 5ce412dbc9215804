//! Executable checking: run candidate calls and compare their results.
//!
//! Each candidate is a call expression evaluated through the sandboxed
//! [`interpreter`](crate::interpreter). Its result is compared with the
//! expected result under one of three [`ResultMatch`] criteria.

use std::str::FromStr;

use callcheck_core::{Attempt, DiagnosticList, ErrorType, TestCategory, Value, Verdict};
use serde::{Deserialize, Serialize};

use crate::config::CheckerConfig;
use crate::interpreter::{evaluate, FunctionLibrary};
use crate::quoted;

/// How an execution result is compared with the expected result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMatch {
    /// Python equality.
    ExactMatch,
    /// Numbers within the configured relative tolerance.
    RealTimeMatch,
    /// Same type; dicts with the same keys, lists with the same length.
    #[serde(other)]
    StructuralMatch,
}

impl FromStr for ResultMatch {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to structural matching.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "exact_match" => ResultMatch::ExactMatch,
            "real_time_match" => ResultMatch::RealTimeMatch,
            _ => ResultMatch::StructuralMatch,
        })
    }
}

/// Executable checker for one test item.
pub struct ExecutableChecker<'a> {
    library: &'a FunctionLibrary,
    category: TestCategory,
    config: &'a CheckerConfig,
    sanity_check: bool,
}

impl<'a> ExecutableChecker<'a> {
    pub fn new(library: &'a FunctionLibrary, category: TestCategory, config: &'a CheckerConfig) -> Self {
        ExecutableChecker {
            library,
            category,
            config,
            sanity_check: false,
        }
    }

    /// Compares dict results by element count only. Used when the expected
    /// results were recorded from live APIs whose keys drift.
    pub fn with_sanity_check(mut self, sanity_check: bool) -> Self {
        self.sanity_check = sanity_check;
        self
    }

    /// Checks the candidate calls of one item.
    ///
    /// `expected` and `criteria` run in parallel, one entry per expected
    /// call. `executable_simple` items take exactly one call; every other
    /// executable category is checked order-free.
    pub fn run(&self, calls: &[String], expected: &[Value], criteria: &[ResultMatch]) -> Verdict {
        if expected.len() != criteria.len() {
            return Verdict::invalid(
                ErrorType::ExecExpectationMismatch,
                format!(
                    "Expected results and match criteria disagree in length: {} vs {}.",
                    expected.len(),
                    criteria.len()
                ),
            );
        }

        let verdict = if self.category == TestCategory::ExecutableSimple {
            if calls.len() != 1 {
                Verdict::invalid(
                    ErrorType::ExecWrongCount,
                    format!(
                        "Wrong number of functions provided. Expected 1, but got {}.",
                        calls.len()
                    ),
                )
            } else if let (Some(result), Some(criterion)) = (expected.first(), criteria.first()) {
                self.check_simple(&calls[0], result, *criterion, self.sanity_check)
            } else {
                Verdict::invalid(ErrorType::ExecExpectationMismatch, "No expected result recorded.")
            }
        } else {
            self.check_no_order(calls, expected, criteria)
        };

        tracing::debug!(
            category = %self.category,
            calls = calls.len(),
            valid = verdict.is_valid(),
            "executable check finished"
        );
        verdict
    }

    /// Evaluates one call and compares its result with `expected`.
    pub fn check_simple(
        &self,
        call: &str,
        expected: &Value,
        criterion: ResultMatch,
        sanity_check: bool,
    ) -> Verdict {
        let output = match evaluate(call, self.library) {
            Ok(value) => value.tuple_into_list(),
            Err(err) => {
                return Verdict::invalid(
                    ErrorType::ExecutionError,
                    format!("Error in execution: {}. Error: {}", quoted(call), err),
                )
            }
        };

        match criterion {
            ResultMatch::ExactMatch if output != *expected => Verdict::invalid(
                ErrorType::WrongResult,
                format!(
                    "Wrong execution result for {}. Expected: {}, but got: {}.",
                    quoted(call),
                    expected,
                    output
                ),
            )
            .with_output(output),
            ResultMatch::ExactMatch => Verdict::Valid,
            ResultMatch::RealTimeMatch => self.real_time_match(call, output, expected),
            ResultMatch::StructuralMatch => structural_match(call, output, expected, sanity_check),
        }
    }

    fn real_time_match(&self, call: &str, output: Value, expected: &Value) -> Verdict {
        let tolerance = self.config.real_time_tolerance;
        let (Some(target), Some(actual)) = (expected.as_f64(), output.as_f64()) else {
            return Verdict::invalid(
                ErrorType::WrongResultRealTime,
                format!(
                    "Wrong execution result for {}. Expected: {}, but got: {}. Type needs to be float or int for real time match criteria.",
                    quoted(call),
                    expected,
                    output
                ),
            )
            .with_output(output);
        };

        if (actual - target).abs() <= target.abs() * tolerance {
            return Verdict::Valid;
        }
        Verdict::invalid(
            ErrorType::WrongResultRealTime,
            format!(
                "Wrong execution result for {}. Expected: {}, but got: {}. {}% difference allowed.",
                quoted(call),
                expected,
                output,
                Value::Float(tolerance * 100.0)
            ),
        )
        .with_output(output)
    }

    /// Order-free pairing of expected results with candidate calls. Each
    /// expected result claims the first unmatched call that produces it.
    pub fn check_no_order(
        &self,
        calls: &[String],
        expected: &[Value],
        criteria: &[ResultMatch],
    ) -> Verdict {
        if calls.len() != expected.len() {
            return Verdict::invalid(
                ErrorType::ExecResultCount,
                format!(
                    "Wrong number of functions provided. Expected {}, but got {}.",
                    expected.len(),
                    calls.len()
                ),
            );
        }

        let mut matched = vec![false; calls.len()];
        for (exp_index, (result, criterion)) in expected.iter().zip(criteria).enumerate() {
            let mut attempts = Vec::new();
            let mut found = false;
            for (index, call) in calls.iter().enumerate() {
                if matched[index] {
                    continue;
                }
                let verdict = self.check_simple(call, result, *criterion, false);
                match verdict.failure() {
                    None => {
                        tracing::trace!(expected = exp_index, candidate = index, "matched result");
                        matched[index] = true;
                        found = true;
                        break;
                    }
                    Some(failure) => attempts.push(Attempt {
                        candidate_index: index,
                        error_type: failure.error_type,
                        message: verdict.message().unwrap_or_default().to_string(),
                        candidate: Some(serde_json::Value::String(call.clone())),
                        expected: Some(result.to_json()),
                        execution_output: failure.execution_output.clone(),
                    }),
                }
            }

            if !found {
                let considered: Vec<usize> = (0..calls.len()).filter(|i| !matched[*i]).collect();
                return Verdict::diagnostics(
                    ErrorType::ExecNoMatch,
                    DiagnosticList {
                        summary: format!(
                            "Could not find a matching function among index {:?} of model output for index {} of possible answers.",
                            considered, exp_index
                        ),
                        attempts,
                    },
                );
            }
        }
        Verdict::Valid
    }
}

/// Same runtime type; dicts must share key sets and lists lengths.
fn structural_match(call: &str, output: Value, expected: &Value, sanity_check: bool) -> Verdict {
    if output.kind() != expected.kind() {
        return Verdict::invalid(
            ErrorType::WrongResultType,
            format!(
                "Wrong execution result type for {}. Expected type: {}, but got: {}.",
                quoted(call),
                python_class(expected),
                python_class(&output)
            ),
        )
        .with_output(output);
    }

    let failure = match (&output, expected) {
        (Value::Dict(actual), Value::Dict(wanted)) if sanity_check => {
            (actual.len() != wanted.len()).then(|| {
                (
                    ErrorType::WrongResultDictLength,
                    format!(
                        "Expect type Dict, but wrong number of elements in the output. Expected length: {}, but got: {}.",
                        wanted.len(),
                        actual.len()
                    ),
                )
            })
        }
        (Value::Dict(actual), Value::Dict(wanted)) => {
            if let Some(key) = wanted.keys().find(|key| !actual.contains_key(*key)) {
                Some((
                    ErrorType::WrongResultDictKeyNotFound,
                    format!("Expect type Dict, but key {} not found in the model output.", quoted(key)),
                ))
            } else {
                actual.keys().find(|key| !wanted.contains_key(*key)).map(|key| {
                    (
                        ErrorType::WrongResultDictExtraKey,
                        format!(
                            "Expect type Dict, but key {} not expected in the model output.",
                            quoted(key)
                        ),
                    )
                })
            }
        }
        (Value::List(actual), Value::List(wanted)) => (actual.len() != wanted.len()).then(|| {
            (
                ErrorType::WrongResultListLength,
                format!(
                    "Expect type list, but wrong number of elements in the output. Expected length: {}, but got: {}.",
                    wanted.len(),
                    actual.len()
                ),
            )
        }),
        _ => None,
    };

    match failure {
        None => Verdict::Valid,
        Some((error_type, detail)) => Verdict::invalid(
            error_type,
            format!("Wrong execution result pattern for {}. {}", quoted(call), detail),
        )
        .with_output(output),
    }
}

fn python_class(value: &Value) -> String {
    format!("<class '{}'>", value.type_name())
}
