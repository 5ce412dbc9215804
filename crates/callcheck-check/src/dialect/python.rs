//! Python parameter typing.
//!
//! Values arrive already typed, so resolution is a plain table lookup. The
//! integer-to-float widening and tuple-to-list rules are applied by the
//! structural checker, which knows the declared type name.

use callcheck_core::TestLanguage;

use super::{CanonicalType, Dialect};

/// Types whose elements are checked one level deep.
const NESTED_TYPES: [&str; 2] = ["array", "tuple"];

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonDialect;

impl Dialect for PythonDialect {
    fn language(&self) -> TestLanguage {
        TestLanguage::Python
    }

    fn resolve(&self, declared: &str) -> Option<CanonicalType> {
        let resolved = match declared {
            "string" => CanonicalType::String,
            "integer" => CanonicalType::Integer,
            "float" => CanonicalType::Float,
            "boolean" => CanonicalType::Boolean,
            "array" | "tuple" => CanonicalType::List,
            "dict" => CanonicalType::Dict,
            "any" => CanonicalType::String,
            _ => return None,
        };
        Some(resolved)
    }

    fn is_nested(&self, declared: &str) -> bool {
        NESTED_TYPES.contains(&declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_table() {
        let dialect = PythonDialect;
        assert_eq!(dialect.resolve("tuple"), Some(CanonicalType::List));
        assert_eq!(dialect.resolve("any"), Some(CanonicalType::String));
        assert_eq!(dialect.resolve("HashMap"), None);
        assert!(dialect.is_nested("array"));
        assert!(!dialect.is_nested("dict"));
    }
}
