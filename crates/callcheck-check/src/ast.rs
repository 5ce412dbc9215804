//! Structural (AST) checking of decoded function calls.
//!
//! [`AstChecker`] validates decoded calls against the function schemas and
//! the ground truth of one test item without executing anything:
//!
//! - [`AstChecker::check_simple`] checks one call against one expected call
//! - [`AstChecker::check_enforce_order`] pairs calls with expected calls by
//!   position
//! - [`AstChecker::check_no_order`] pairs them greedily, in ground-truth
//!   order, with the first unmatched call that passes
//!
//! The greedy pairing is not a maximum matching: when two expected calls can
//! both be satisfied by the same candidate, the earlier one claims it even if
//! the later one had no other option. Historical scores depend on this.

use std::borrow::Cow;

use callcheck_core::{
    find_schema, Attempt, CandidateCall, DiagnosticList, ErrorType, ExpectedCall, FunctionSchema,
    TestCategory, Value, Verdict,
};

use crate::config::{CallOrder, CheckerConfig};
use crate::dialect::{dialect_for, CanonicalType, Dialect};
use crate::matchers::{check_dict, check_list, check_list_of_dicts, check_string};
use crate::typecheck::check_type;
use crate::{listed, quoted};

/// Structural checker for one test item's category and model.
pub struct AstChecker<'a> {
    schemas: &'a [FunctionSchema],
    model_name: &'a str,
    category: TestCategory,
    config: &'a CheckerConfig,
    dialect: &'static dyn Dialect,
}

impl<'a> AstChecker<'a> {
    pub fn new(
        schemas: &'a [FunctionSchema],
        model_name: &'a str,
        category: TestCategory,
        config: &'a CheckerConfig,
    ) -> Self {
        AstChecker {
            schemas,
            model_name,
            category,
            config,
            dialect: dialect_for(category.language()),
        }
    }

    /// Checks a decoded model output against the ground truth.
    ///
    /// `simple` items expect exactly one call; every other category goes
    /// through the multi-call checker selected by [`CallOrder`].
    pub fn run(&self, candidates: &[CandidateCall], ground_truth: &[ExpectedCall]) -> Verdict {
        let verdict = if self.category == TestCategory::Simple {
            self.run_single(candidates, ground_truth)
        } else {
            match self.config.call_order {
                CallOrder::Any => self.check_no_order(candidates, ground_truth),
                CallOrder::Strict => self.check_enforce_order(candidates, ground_truth),
            }
        };
        tracing::debug!(
            category = %self.category,
            model = self.model_name,
            valid = verdict.is_valid(),
            "ast check finished"
        );
        verdict
    }

    fn run_single(&self, candidates: &[CandidateCall], ground_truth: &[ExpectedCall]) -> Verdict {
        if candidates.len() != 1 {
            return Verdict::invalid(ErrorType::WrongCount, "Wrong number of functions.");
        }
        let (Some(schema), Some(expected)) = (self.schemas.first(), ground_truth.first()) else {
            return Verdict::invalid(
                ErrorType::MissingDescription,
                "Function doc description or ground truth missing for single-call item.",
            );
        };
        self.check_simple(schema, &candidates[0], expected)
    }

    /// Checks one decoded call against one expected call described by
    /// `schema`.
    pub fn check_simple(
        &self,
        schema: &FunctionSchema,
        candidate: &CandidateCall,
        expected: &ExpectedCall,
    ) -> Verdict {
        let func_name = self.candidate_name(&schema.name);
        let Some(args) = candidate.args(&func_name) else {
            return Verdict::invalid(
                ErrorType::WrongFuncName,
                format!("Function name {} not found in model output.", quoted(&func_name)),
            );
        };

        if let Some(missing) = schema.required().iter().find(|param| !args.contains_key(*param)) {
            return Verdict::invalid(
                ErrorType::MissingRequired,
                format!("Missing required parameter: {}.", quoted(missing)),
            );
        }

        for (param, value) in args {
            let (Some(spec), Some(accepted)) = (schema.param(param), expected.accepted(param))
            else {
                return Verdict::invalid(
                    ErrorType::UnexpectedParam,
                    format!("Unexpected parameter: {}.", quoted(param)),
                );
            };
            let verdict = self.check_param(param, value, &spec.type_name, spec.item_type(), accepted);
            if !verdict.is_valid() {
                return verdict;
            }
        }

        for param in expected.params.keys() {
            if !args.contains_key(param) && !expected.allows_absent(param) {
                return Verdict::invalid(
                    ErrorType::MissingOptional,
                    format!(
                        "Optional parameter {} not provided and not marked as optional.",
                        quoted(param)
                    ),
                );
            }
        }

        Verdict::Valid
    }

    fn check_param(
        &self,
        param: &str,
        value: &Value,
        declared: &str,
        item_type: Option<&str>,
        accepted: &[Value],
    ) -> Verdict {
        let Some(expected_type) = self.dialect.resolve(declared) else {
            return unknown_type(param, declared);
        };
        let item_type = if self.dialect.is_nested(declared) { item_type } else { None };
        let nested_type = match item_type {
            Some(item) => match self.dialect.resolve(item) {
                Some(resolved) => Some(resolved),
                None => return unknown_type(param, item),
            },
            None => None,
        };

        let value = match self.prepare_value(param, value, declared, item_type) {
            Ok(value) => value,
            Err(verdict) => return verdict,
        };

        let type_check = check_type(param, &value, accepted, declared, expected_type, nested_type);
        if !type_check.verdict.is_valid() {
            return type_check.verdict;
        }

        if !type_check.is_variable {
            match (expected_type, &value) {
                (CanonicalType::Dict, Value::Dict(map)) => return check_dict(param, map, accepted),
                (CanonicalType::List, Value::List(items))
                    if nested_type == Some(CanonicalType::Dict) =>
                {
                    return check_list_of_dicts(param, items, accepted)
                }
                (CanonicalType::String, Value::Str(text)) => {
                    return check_string(param, text, accepted)
                }
                (CanonicalType::List, Value::List(items)) => {
                    return check_list(param, items, accepted)
                }
                _ => {}
            }
        }

        if accepted.contains(&value) {
            Verdict::Valid
        } else {
            Verdict::invalid(
                ErrorType::ValueOthers,
                format!(
                    "Invalid value for parameter {}: {}. Expected one of {}.",
                    quoted(param),
                    value,
                    listed(accepted)
                ),
            )
        }
    }

    /// Decodes dialect source text and applies the Python coercions: tuples
    /// declared as `tuple` become lists, integers declared as `float` widen.
    fn prepare_value(
        &self,
        param: &str,
        value: &Value,
        declared: &str,
        item_type: Option<&str>,
    ) -> Result<Value, Verdict> {
        if self.dialect.requires_string_encoding() {
            let Value::Str(raw) = value else {
                return Err(Verdict::invalid(
                    self.dialect.encoding_error(),
                    format!(
                        "Incorrect type for parameter {}. Expected type String, got {}. Parameter value: {}.",
                        quoted(param),
                        value.type_name(),
                        value
                    ),
                ));
            };
            return self.dialect.decode(raw, declared, item_type).map_err(|err| {
                Verdict::invalid(
                    self.dialect.encoding_error(),
                    format!(
                        "Cannot convert parameter {} to {}: {}.",
                        quoted(param),
                        declared,
                        err
                    ),
                )
            });
        }

        Ok(match value {
            Value::Tuple(items) if declared == "tuple" => Value::List(items.clone()),
            Value::Int(i) if declared == "float" => Value::Float(*i as f64),
            other => other.clone(),
        })
    }

    /// Checks calls against expected calls position by position.
    pub fn check_enforce_order(
        &self,
        candidates: &[CandidateCall],
        ground_truth: &[ExpectedCall],
    ) -> Verdict {
        if candidates.len() != ground_truth.len() {
            return Verdict::invalid(ErrorType::EnforceOrderWrongCount, "Wrong number of functions.");
        }

        for (candidate, expected) in candidates.iter().zip(ground_truth) {
            let Some(schema) = find_schema(self.schemas, &expected.name) else {
                return missing_description(ErrorType::EnforceOrderMissingDescription, &expected.name);
            };
            let verdict = self.check_simple(schema, candidate, expected);
            if !verdict.is_valid() {
                return verdict;
            }
        }
        Verdict::Valid
    }

    /// Pairs every expected call with the first unmatched candidate that
    /// passes [`AstChecker::check_simple`], consuming candidates greedily.
    pub fn check_no_order(&self, candidates: &[CandidateCall], ground_truth: &[ExpectedCall]) -> Verdict {
        if candidates.len() != ground_truth.len() {
            return Verdict::invalid(ErrorType::NoOrderWrongCount, "Wrong number of functions.");
        }

        let mut matched = vec![false; candidates.len()];
        for (gt_index, expected) in ground_truth.iter().enumerate() {
            let Some(schema) = find_schema(self.schemas, &expected.name) else {
                return missing_description(ErrorType::NoOrderMissingDescription, &expected.name);
            };

            let mut attempts = Vec::new();
            let mut found = false;
            for (index, candidate) in candidates.iter().enumerate() {
                if matched[index] {
                    continue;
                }
                let verdict = self.check_simple(schema, candidate, expected);
                match verdict.failure() {
                    None => {
                        tracing::trace!(expected = gt_index, candidate = index, "matched call");
                        matched[index] = true;
                        found = true;
                        break;
                    }
                    Some(failure) => attempts.push(Attempt {
                        candidate_index: index,
                        error_type: failure.error_type,
                        message: verdict.message().unwrap_or_default().to_string(),
                        candidate: Some(candidate.to_json()),
                        expected: serde_json::to_value(expected).ok(),
                        execution_output: None,
                    }),
                }
            }

            if !found {
                let considered: Vec<usize> = (0..candidates.len()).filter(|i| !matched[*i]).collect();
                return Verdict::diagnostics(
                    ErrorType::NoOrderNoMatch,
                    DiagnosticList {
                        summary: format!(
                            "Could not find a matching function among index {:?} of model output for index {} of possible answers.",
                            considered, gt_index
                        ),
                        attempts,
                    },
                );
            }
        }
        Verdict::Valid
    }

    /// The function name the model was expected to emit for `name`.
    fn candidate_name<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if name.contains('.') && self.config.rewrites_dotted_names(self.model_name) {
            Cow::Owned(name.replace('.', "_"))
        } else {
            Cow::Borrowed(name)
        }
    }
}

fn unknown_type(param: &str, declared: &str) -> Verdict {
    Verdict::invalid(
        ErrorType::UnknownType,
        format!(
            "Unknown type {} declared for parameter {}.",
            quoted(declared),
            quoted(param)
        ),
    )
}

fn missing_description(error_type: ErrorType, name: &str) -> Verdict {
    Verdict::invalid(
        error_type,
        format!("Function doc description not found for function name: {}.", quoted(name)),
    )
}
