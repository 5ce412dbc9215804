//! Value matchers for parameters that passed the type check.
//!
//! Each matcher compares a candidate value against the accepted variants of
//! one parameter and returns a [`Verdict`]. Strings, and strings nested in
//! lists and dictionaries, are compared in their standardized form.

use callcheck_core::{ErrorType, Value, Verdict};
use indexmap::IndexMap;

use crate::normalize::{standardize_elements, standardize_string, standardize_value};
use crate::{listed, quoted};

/// Accepts `output` when its standardized form equals the standardized form
/// of any string variant.
pub fn check_string(param: &str, output: &str, accepted: &[Value]) -> Verdict {
    let standardized = standardize_string(output);
    let found = accepted
        .iter()
        .filter_map(Value::as_str)
        .any(|variant| standardize_string(variant) == standardized);
    if found {
        return Verdict::Valid;
    }
    Verdict::invalid(
        ErrorType::ValueString,
        format!(
            "Invalid value for parameter {}: {}. Expected one of {}. Case insensitive.",
            quoted(param),
            quoted(output),
            listed(accepted)
        ),
    )
}

/// Accepts `output` when it equals one of the list variants position by
/// position, after standardizing string elements on both sides.
///
/// The absent marker counts as an empty list. Other non-sequence variants
/// never match.
pub fn check_list(param: &str, output: &[Value], accepted: &[Value]) -> Verdict {
    let standardized = standardize_elements(output);
    let found = accepted.iter().any(|variant| {
        let items: &[Value] = match variant {
            Value::Str(s) if s.is_empty() => &[],
            other => match other.as_sequence() {
                Some(items) => items,
                None => return false,
            },
        };
        standardize_elements(items) == standardized
    });
    if found {
        return Verdict::Valid;
    }
    Verdict::invalid(
        ErrorType::ValueListTuple,
        format!(
            "Invalid value for parameter {}: {}. Expected one of {}.",
            quoted(param),
            Value::List(output.to_vec()),
            listed(accepted)
        ),
    )
}

/// Accepts `output` when it matches one dictionary variant key for key.
///
/// Each variant maps keys to lists of accepted values, or to a nested
/// dictionary variant that is matched recursively. When no variant matches,
/// the failure from the last variant tried is reported.
pub fn check_dict(param: &str, output: &IndexMap<String, Value>, accepted: &[Value]) -> Verdict {
    let mut last = Verdict::invalid(
        ErrorType::DictUnclear,
        format!("No dictionary variant to compare for parameter {}.", quoted(param)),
    );
    for variant in accepted {
        if variant.is_absent_marker() {
            continue;
        }
        let Some(variant) = variant.as_dict() else {
            continue;
        };
        match dict_against_variant(param, output, variant) {
            Verdict::Valid => return Verdict::Valid,
            failure => last = failure,
        }
    }
    last
}

fn dict_against_variant(
    param: &str,
    output: &IndexMap<String, Value>,
    variant: &IndexMap<String, Value>,
) -> Verdict {
    if output.len() != variant.len() {
        return Verdict::invalid(
            ErrorType::DictItems,
            "Wrong number of parameters for dictionary.",
        );
    }

    for (key, value) in output {
        let Some(expected) = variant.get(key) else {
            return Verdict::invalid(
                ErrorType::DictKey,
                format!("Unexpected parameter: {}.", quoted(key)),
            );
        };

        if let Value::Dict(_) = expected {
            let verdict = match value.as_dict() {
                Some(inner) => check_dict(param, inner, std::slice::from_ref(expected)),
                None => invalid_dict_value(key, value, std::slice::from_ref(expected)),
            };
            if !verdict.is_valid() {
                return verdict;
            }
            continue;
        }

        let options = match expected {
            Value::List(items) => standardize_elements(items),
            single => vec![standardize_value(single)],
        };
        if !options.contains(&standardize_value(value)) {
            return invalid_dict_value(key, value, &options);
        }
    }
    Verdict::Valid
}

fn invalid_dict_value(key: &str, value: &Value, options: &[Value]) -> Verdict {
    Verdict::invalid(
        ErrorType::DictValue,
        format!(
            "Invalid value for parameter {}: {}. Expected one of {}.",
            quoted(key),
            value,
            listed(options)
        ),
    )
}

/// Accepts a list of dictionaries when some variant has the same length and
/// every position passes [`check_dict`] against the variant's dictionary at
/// that position.
pub fn check_list_of_dicts(param: &str, output: &[Value], accepted: &[Value]) -> Verdict {
    let mut last = Verdict::invalid(
        ErrorType::ListDictUnclear,
        format!("No list-of-dictionary variant to compare for parameter {}.", quoted(param)),
    );
    for variant in accepted {
        let expected: &[Value] = match variant {
            Value::Str(s) if s.is_empty() => &[],
            other => match other.as_sequence() {
                Some(items) => items,
                None => continue,
            },
        };
        if output.len() != expected.len() {
            last = Verdict::invalid(
                ErrorType::ListDictCount,
                "Wrong number of dictionaries in the list.",
            );
            continue;
        }

        let mismatch = output.iter().zip(expected).find_map(|(item, expected)| {
            let verdict = match item.as_dict() {
                Some(map) => check_dict(param, map, std::slice::from_ref(expected)),
                None => invalid_dict_value(param, item, std::slice::from_ref(expected)),
            };
            (!verdict.is_valid()).then_some(verdict)
        });
        match mismatch {
            None => return Verdict::Valid,
            Some(failure) => last = failure,
        }
    }
    last
}
