//! Runs the checker over every item of one category.

use callcheck_check::format::{
    ast_calls, ast_decode_failure, check_relevance, executable_calls, executable_decode_failure,
    rest_call,
};
use callcheck_check::{
    AstChecker, CheckerConfig, ExecutableChecker, FunctionLibrary, RestChecker, RestTransport,
};
use callcheck_core::{ErrorType, TestCategory, Value, Verdict};

use crate::dataset::{ModelResponse, PossibleAnswer, TestItem};
use crate::error::CliError;
use crate::score::{CategoryScore, FailureRecord};

/// The outcome of one category.
#[derive(Debug)]
pub struct CategoryReport {
    pub category: TestCategory,
    pub score: CategoryScore,
    pub failures: Vec<FailureRecord>,
}

/// Everything a check needs besides the item itself.
pub struct Runner<'a, T: RestTransport> {
    pub config: &'a CheckerConfig,
    pub library: &'a FunctionLibrary,
    pub transport: &'a T,
    pub model_name: &'a str,
}

/// Whether a category is scored against possible-answer files.
pub fn needs_possible_answers(category: TestCategory) -> bool {
    !category.is_executable() && category != TestCategory::Relevance
}

impl<'a, T: RestTransport> Runner<'a, T> {
    /// Checks aligned items, answers and responses of one category.
    ///
    /// `answers` is ignored for executable and relevance categories.
    pub fn evaluate(
        &self,
        category: TestCategory,
        items: &[TestItem],
        answers: &[PossibleAnswer],
        responses: &[ModelResponse],
    ) -> Result<CategoryReport, CliError> {
        let needs_answers = needs_possible_answers(category);
        if responses.len() != items.len() || (needs_answers && answers.len() != items.len()) {
            return Err(CliError::LengthMismatch {
                category: category.to_string(),
                items: items.len(),
                answers: answers.len(),
                responses: responses.len(),
            });
        }

        let mut correct = 0;
        let mut failures = Vec::new();
        for (index, (item, response)) in items.iter().zip(responses).enumerate() {
            let answer = if needs_answers { answers.get(index) } else { None };
            let verdict = self.check_item(category, item, answer, response);
            tracing::trace!(id = %item.id, valid = verdict.is_valid(), "item checked");

            match FailureRecord::from_verdict(verdict, &item.id, category, self.model_name) {
                None => correct += 1,
                Some(mut record) => {
                    record.question = item.question.clone();
                    record.func_doc = item.function.clone();
                    record.model_response_raw = response.result.clone();
                    record.model_response_decoded = response.decoded.clone();
                    record.possible_answer = match answer {
                        Some(answer) => serde_json::to_value(&answer.ground_truth).ok(),
                        None if category.is_executable() => {
                            Some(serde_json::Value::Array(item.execution_result.clone()))
                        }
                        None => None,
                    };
                    failures.push(record);
                }
            }
        }

        let score = CategoryScore::new(correct, items.len());
        tracing::info!(
            %category,
            model = self.model_name,
            accuracy = score.accuracy,
            correct,
            total = items.len(),
            "category scored"
        );
        Ok(CategoryReport {
            category,
            score,
            failures,
        })
    }

    fn check_item(
        &self,
        category: TestCategory,
        item: &TestItem,
        answer: Option<&PossibleAnswer>,
        response: &ModelResponse,
    ) -> Verdict {
        if category == TestCategory::Relevance {
            return check_relevance(response.decoded.as_ref());
        }

        let Some(decoded) = response.decoded.as_ref() else {
            return if category.is_executable() {
                executable_decode_failure(response.decode_error())
            } else {
                ast_decode_failure(response.decode_error())
            };
        };

        match category {
            TestCategory::Rest => {
                let call = match rest_call(decoded) {
                    Ok(call) => call,
                    Err(verdict) => return verdict,
                };
                let Some(expected) = item.execution_result.first() else {
                    return missing_expectation();
                };
                RestChecker::new(self.transport, self.config).run(&call, expected)
            }
            _ if category.is_executable() => {
                let calls = match executable_calls(decoded) {
                    Ok(calls) => calls,
                    Err(verdict) => return verdict,
                };
                let expected: Vec<Value> =
                    item.execution_result.iter().cloned().map(Value::from).collect();
                ExecutableChecker::new(self.library, category, self.config).run(
                    &calls,
                    &expected,
                    &item.execution_result_type,
                )
            }
            _ => {
                let candidates = match ast_calls(decoded) {
                    Ok(candidates) => candidates,
                    Err(verdict) => return verdict,
                };
                let Some(answer) = answer else {
                    return Verdict::invalid(
                        ErrorType::MissingDescription,
                        "No possible answer recorded for this item.",
                    );
                };
                AstChecker::new(&item.function, self.model_name, category, self.config)
                    .run(&candidates, &answer.ground_truth)
            }
        }
    }
}

fn missing_expectation() -> Verdict {
    Verdict::invalid(
        ErrorType::ExecExpectationMismatch,
        "No expected result recorded.",
    )
}
