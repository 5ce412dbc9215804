//! String canonicalization for loose comparison.
//!
//! Acceptable answers routinely differ only in spacing, punctuation or case
//! (`"April 1, 2024"` vs `"april 1 2024"`), so strings are compared after:
//!
//! - removing spaces and the separators `, . / - _ * ^`
//! - lowercasing
//! - replacing single quotes with double quotes

use callcheck_core::Value;

const STRIPPED: [char; 8] = [' ', ',', '.', '/', '-', '_', '*', '^'];

/// Canonical form of `input` for membership tests.
pub fn standardize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .collect::<String>()
        .to_lowercase()
        .replace('\'', "\"")
}

/// Standardizes strings and passes every other value through unchanged.
pub fn standardize_value(value: &Value) -> Value {
    match value {
        Value::Str(s) => Value::Str(standardize_string(s)),
        other => other.clone(),
    }
}

/// Standardizes the string elements of a sequence.
pub fn standardize_elements(items: &[Value]) -> Vec<Value> {
    items.iter().map(standardize_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_separators_and_case() {
        assert_eq!(standardize_string("New York"), "newyork");
        assert_eq!(standardize_string("new-york"), "newyork");
        assert_eq!(standardize_string("boston, MA"), "bostonma");
        assert_eq!(standardize_string("boston,ma"), "bostonma");
        assert_eq!(standardize_string("2^3*x_1/y.z"), "23x1yz");
    }

    #[test]
    fn unifies_quote_style() {
        assert_eq!(standardize_string("it's"), "it\"s");
        assert_eq!(standardize_string("'a'"), standardize_string("\"a\""));
    }

    #[test]
    fn different_words_stay_different() {
        assert_ne!(standardize_string("NewYork City"), standardize_string("New York"));
    }

    #[test]
    fn non_strings_pass_through() {
        assert_eq!(standardize_value(&Value::Int(3)), Value::Int(3));
        assert_eq!(
            standardize_elements(&[Value::from("A B"), Value::Float(1.5)]),
            vec![Value::from("ab"), Value::Float(1.5)]
        );
    }

    proptest! {
        #[test]
        fn is_idempotent(s in "[ -~]*") {
            let once = standardize_string(&s);
            prop_assert_eq!(standardize_string(&once), once);
        }

        #[test]
        fn ignores_ascii_case(s in "[a-zA-Z ,.-]*") {
            prop_assert_eq!(
                standardize_string(&s.to_uppercase()),
                standardize_string(&s.to_lowercase())
            );
        }

        #[test]
        fn output_has_no_separators(s in ".*") {
            let out = standardize_string(&s);
            prop_assert!(!out.chars().any(|c| STRIPPED.contains(&c)));
        }
    }
}
