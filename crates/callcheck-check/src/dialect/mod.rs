//! Parameter-typing dialects.
//!
//! Function schemas declare parameter types in the vocabulary of the target
//! language of the test item. A [`Dialect`] resolves a declared type name to
//! a [`CanonicalType`] and, for dialects whose candidates arrive as source
//! text, decodes that text into a [`Value`] before comparison.
//!
//! Three fixed implementations exist, selected by [`dialect_for`]:
//! - [`PythonDialect`]: values arrive already typed; no decoding
//! - [`JavaDialect`]: values arrive as Java source literals
//! - [`JavaScriptDialect`]: values arrive as JavaScript source literals

pub mod java;
pub mod javascript;
pub(crate) mod literal;
pub mod python;

use std::fmt;

use callcheck_core::{ErrorType, TestLanguage, Value, ValueKind};
use serde::Serialize;

pub use java::JavaDialect;
pub use javascript::JavaScriptDialect;
pub use python::PythonDialect;

/// The comparison category a declared type resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalType {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Set,
    Dict,
}

impl CanonicalType {
    /// The runtime kind a value of this type has.
    pub fn kind(self) -> ValueKind {
        match self {
            CanonicalType::String => ValueKind::Str,
            CanonicalType::Integer => ValueKind::Int,
            CanonicalType::Float => ValueKind::Float,
            CanonicalType::Boolean => ValueKind::Bool,
            CanonicalType::List => ValueKind::List,
            CanonicalType::Set => ValueKind::Set,
            CanonicalType::Dict => ValueKind::Dict,
        }
    }

    /// Whether `value` has exactly this runtime type.
    pub fn matches(self, value: &Value) -> bool {
        value.kind() == self.kind()
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().name())
    }
}

/// Failure to decode a dialect's source-text value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("unbalanced brackets in '{input}'")]
    Unbalanced { input: String },

    #[error("unterminated string literal in '{input}'")]
    UnterminatedString { input: String },

    #[error("malformed entry '{entry}' in '{input}'")]
    MalformedEntry { entry: String, input: String },
}

/// A parameter-typing vocabulary for one target language.
pub trait Dialect: Sync {
    fn language(&self) -> TestLanguage;

    /// Resolves a declared type name, or `None` if the dialect does not know it.
    fn resolve(&self, declared: &str) -> Option<CanonicalType>;

    /// Whether `declared` carries an element type in `items.type`.
    fn is_nested(&self, declared: &str) -> bool;

    /// Whether candidate values must arrive as source text.
    fn requires_string_encoding(&self) -> bool {
        false
    }

    /// Decodes source text for a parameter declared as `declared` whose
    /// elements (if nested) are declared as `item_type`.
    ///
    /// Text that is not a literal of the declared type is returned as a plain
    /// string, so that variable references can still be matched.
    fn decode(
        &self,
        raw: &str,
        _declared: &str,
        _item_type: Option<&str>,
    ) -> Result<Value, ConversionError> {
        Ok(Value::Str(raw.to_string()))
    }

    /// The error tag for values that violate the dialect's encoding.
    fn encoding_error(&self) -> ErrorType {
        ErrorType::TypeSimple
    }
}

static PYTHON: PythonDialect = PythonDialect;
static JAVA: JavaDialect = JavaDialect;
static JAVASCRIPT: JavaScriptDialect = JavaScriptDialect;

/// The dialect for a test item's target language.
pub fn dialect_for(language: TestLanguage) -> &'static dyn Dialect {
    match language {
        TestLanguage::Python => &PYTHON,
        TestLanguage::Java => &JAVA,
        TestLanguage::JavaScript => &JAVASCRIPT,
    }
}

/// Collection types whose element type is decoded for string-encoded dialects.
pub(crate) const NESTED_CONVERSION_TYPES: [&str; 3] = ["Array", "ArrayList", "array"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_lookup_by_language() {
        assert_eq!(dialect_for(TestLanguage::Java).language(), TestLanguage::Java);
        assert!(dialect_for(TestLanguage::JavaScript).requires_string_encoding());
        assert!(!dialect_for(TestLanguage::Python).requires_string_encoding());
    }

    #[test]
    fn same_name_resolves_per_dialect() {
        // "String" is a Java/JS type but not a Python one.
        assert_eq!(dialect_for(TestLanguage::Python).resolve("String"), None);
        assert_eq!(
            dialect_for(TestLanguage::Java).resolve("String"),
            Some(CanonicalType::String)
        );
        assert_eq!(
            dialect_for(TestLanguage::JavaScript).resolve("Boolean"),
            Some(CanonicalType::Boolean)
        );
    }

    #[test]
    fn canonical_types_match_runtime_kinds() {
        assert!(CanonicalType::Float.matches(&Value::Float(1.0)));
        assert!(!CanonicalType::Float.matches(&Value::Int(1)));
        assert!(!CanonicalType::List.matches(&Value::Tuple(vec![])));
        assert_eq!(CanonicalType::Dict.to_string(), "dict");
    }
}
