//! Runtime type checking of a single parameter value.
//!
//! A value passes when its runtime kind equals the resolved declared type.
//! Ground truth may also mark a parameter as symbolic: when the first
//! non-empty accepted value has a different kind than the declared type, the
//! parameter is a *variable placeholder* and any value of that kind is
//! accepted. Element types of collections are checked one level deep only.

use callcheck_core::{ErrorType, Value, ValueKind, Verdict};

use crate::dialect::CanonicalType;
use crate::quoted;

/// Result of [`check_type`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCheck {
    /// The parameter is a variable placeholder; value matchers that assume
    /// the declared type must be skipped.
    pub is_variable: bool,
    pub verdict: Verdict,
}

impl TypeCheck {
    fn new(is_variable: bool, verdict: Verdict) -> Self {
        TypeCheck {
            is_variable,
            verdict,
        }
    }
}

/// Kind of the first accepted value that is not the absent marker.
///
/// `None` when every accepted value is the absent marker, in which case the
/// placeholder rule cannot apply.
pub fn accepted_kind(accepted: &[Value]) -> Option<ValueKind> {
    accepted
        .iter()
        .find(|value| !value.is_absent_marker())
        .map(Value::kind)
}

/// Checks `value` against the declared type of parameter `param`.
///
/// `declared` is the type name as written in the schema and only appears in
/// messages. When `nested` is set, every element of a list value must pass
/// the scalar check against at least one accepted variant that is itself a
/// list.
pub fn check_type(
    param: &str,
    value: &Value,
    accepted: &[Value],
    declared: &str,
    expected: CanonicalType,
    nested: Option<CanonicalType>,
) -> TypeCheck {
    let placeholder_kind = accepted_kind(accepted);
    let is_variable = placeholder_kind.is_some_and(|kind| kind != expected.kind());

    let mut failure = None;
    if expected.matches(value) {
        let Some(inner) = nested else {
            return TypeCheck::new(is_variable, Verdict::Valid);
        };
        if accepted
            .iter()
            .any(|variant| elements_match(param, value, variant, inner))
        {
            return TypeCheck::new(is_variable, Verdict::Valid);
        }
        failure = Some(Verdict::invalid(
            ErrorType::TypeNested,
            format!(
                "Nested type checking failed for parameter {}. Expected outer type {} with inner type {}. Parameter value: {}.",
                quoted(param),
                declared,
                inner,
                value
            ),
        ));
    }

    if placeholder_kind == Some(value.kind()) {
        return TypeCheck::new(true, failure.unwrap_or(Verdict::Valid));
    }

    TypeCheck::new(
        is_variable,
        Verdict::invalid(
            ErrorType::TypeSimple,
            format!(
                "Incorrect type for parameter {}. Expected type {}, got {}. Parameter value: {}.",
                quoted(param),
                declared,
                value.type_name(),
                value
            ),
        ),
    )
}

/// Whether every element of `value` passes the scalar check against the
/// elements of `variant`. Variants that are not lists accept anything.
fn elements_match(param: &str, value: &Value, variant: &Value, inner: CanonicalType) -> bool {
    let Value::List(variant_items) = variant else {
        return true;
    };
    let items = value.as_sequence().unwrap_or_default();
    items.iter().all(|item| {
        check_type(param, item, variant_items, &inner.to_string(), inner, None)
            .verdict
            .is_valid()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(json: serde_json::Value) -> Vec<Value> {
        match Value::from(json) {
            Value::List(items) => items,
            other => vec![other],
        }
    }

    // -----------------------------------------------------------------------
    // Scalar checks
    // -----------------------------------------------------------------------

    #[test]
    fn matching_kind_passes() {
        let check = check_type(
            "n",
            &Value::Int(3),
            &values(json!([3])),
            "integer",
            CanonicalType::Integer,
            None,
        );
        assert!(check.verdict.is_valid());
        assert!(!check.is_variable);
    }

    #[test]
    fn mismatched_kind_fails_with_simple_type_error() {
        let check = check_type(
            "n",
            &Value::from("3"),
            &values(json!([3])),
            "integer",
            CanonicalType::Integer,
            None,
        );
        assert_eq!(check.verdict.error_type(), Some(ErrorType::TypeSimple));
        insta::assert_snapshot!(
            check.verdict.message().unwrap(),
            @"Incorrect type for parameter 'n'. Expected type integer, got str. Parameter value: '3'."
        );
    }

    #[test]
    fn bool_is_not_an_integer() {
        let check = check_type(
            "n",
            &Value::Bool(true),
            &values(json!([1])),
            "integer",
            CanonicalType::Integer,
            None,
        );
        assert!(!check.verdict.is_valid());
    }

    // -----------------------------------------------------------------------
    // Variable placeholders
    // -----------------------------------------------------------------------

    #[test]
    fn string_ground_truth_for_integer_marks_variable() {
        let accepted = values(json!(["", "num_items"]));
        let check = check_type(
            "n",
            &Value::from("num_items"),
            &accepted,
            "integer",
            CanonicalType::Integer,
            None,
        );
        assert!(check.verdict.is_valid());
        assert!(check.is_variable);
    }

    #[test]
    fn declared_kind_still_passes_when_variable() {
        let check = check_type(
            "n",
            &Value::Int(4),
            &values(json!(["count"])),
            "integer",
            CanonicalType::Integer,
            None,
        );
        assert!(check.verdict.is_valid());
        assert!(check.is_variable);
    }

    #[test]
    fn absent_markers_do_not_define_placeholder_kind() {
        assert_eq!(accepted_kind(&values(json!(["", ""]))), None);
        assert_eq!(accepted_kind(&values(json!(["", 2.5]))), Some(ValueKind::Float));
        let check = check_type(
            "x",
            &Value::from("oops"),
            &values(json!([""])),
            "float",
            CanonicalType::Float,
            None,
        );
        assert_eq!(check.verdict.error_type(), Some(ErrorType::TypeSimple));
    }

    // -----------------------------------------------------------------------
    // Nested checks
    // -----------------------------------------------------------------------

    #[test]
    fn nested_elements_checked_against_list_variants() {
        let accepted = values(json!([[1, 2, 3]]));
        let good = Value::from(json!([4, 5]));
        let check = check_type(
            "xs",
            &good,
            &accepted,
            "array",
            CanonicalType::List,
            Some(CanonicalType::Integer),
        );
        assert!(check.verdict.is_valid());

        let bad = Value::from(json!([4, "5"]));
        let check = check_type(
            "xs",
            &bad,
            &accepted,
            "array",
            CanonicalType::List,
            Some(CanonicalType::Integer),
        );
        assert_eq!(check.verdict.error_type(), Some(ErrorType::TypeNested));
        insta::assert_snapshot!(
            check.verdict.message().unwrap(),
            @"Nested type checking failed for parameter 'xs'. Expected outer type array with inner type int. Parameter value: [4, '5']."
        );
    }

    #[test]
    fn absent_marker_variant_accepts_any_elements() {
        let accepted = values(json!([[1, 2], ""]));
        let check = check_type(
            "xs",
            &Value::from(json!(["a"])),
            &accepted,
            "array",
            CanonicalType::List,
            Some(CanonicalType::Integer),
        );
        assert!(check.verdict.is_valid());
    }

    #[test]
    fn nested_elements_may_be_placeholders() {
        let accepted = values(json!([["item_a", "item_b"]]));
        let check = check_type(
            "ids",
            &Value::from(json!(["item_a"])),
            &accepted,
            "array",
            CanonicalType::List,
            Some(CanonicalType::Integer),
        );
        assert!(check.verdict.is_valid());
    }
}
