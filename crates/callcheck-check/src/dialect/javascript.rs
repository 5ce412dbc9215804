//! JavaScript parameter typing and literal decoding.
//!
//! Candidates for JavaScript items pass every argument as source text:
//! quoted strings in any of the three quote styles, numbers, `10n` bigints,
//! booleans, array literals and object literals with bare or quoted keys.

use callcheck_core::{ErrorType, TestLanguage, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::literal::{enclosed_body, split_once_top_level, split_top_level, unquote};
use super::{CanonicalType, ConversionError, Dialect, NESTED_CONVERSION_TYPES};

const QUOTES: [char; 3] = ['"', '\'', '`'];

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());
static BIGINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+n?$").unwrap());
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$").unwrap());
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptDialect;

impl Dialect for JavaScriptDialect {
    fn language(&self) -> TestLanguage {
        TestLanguage::JavaScript
    }

    fn resolve(&self, declared: &str) -> Option<CanonicalType> {
        let resolved = match declared {
            "String" | "any" => CanonicalType::String,
            "integer" | "Bigint" => CanonicalType::Integer,
            "float" => CanonicalType::Float,
            "Boolean" => CanonicalType::Boolean,
            "dict" => CanonicalType::Dict,
            "array" => CanonicalType::List,
            _ => return None,
        };
        Some(resolved)
    }

    fn is_nested(&self, declared: &str) -> bool {
        NESTED_CONVERSION_TYPES.contains(&declared)
    }

    fn requires_string_encoding(&self) -> bool {
        true
    }

    fn decode(
        &self,
        raw: &str,
        declared: &str,
        item_type: Option<&str>,
    ) -> Result<Value, ConversionError> {
        let text = raw.trim();
        let value = match declared {
            "String" => unquote(text, &QUOTES).map(Value::Str),
            "integer" => parse_integer(text, &INTEGER),
            "Bigint" => parse_integer(text, &BIGINT),
            "float" => parse_number(text).map(Value::Float),
            "Boolean" => parse_boolean(text),
            "array" => match array_body(text) {
                Some(body) => Some(Value::List(decode_elements(body, item_type)?)),
                None => None,
            },
            "dict" => match object_body(text) {
                Some(body) => Some(Value::Dict(decode_object(body, text)?)),
                None => None,
            },
            _ => None,
        };
        Ok(value.unwrap_or_else(|| Value::Str(raw.to_string())))
    }

    fn encoding_error(&self) -> ErrorType {
        ErrorType::TypeJavaScript
    }
}

fn parse_integer(text: &str, pattern: &Regex) -> Option<Value> {
    if !pattern.is_match(text) {
        return None;
    }
    text.trim_end_matches('n').parse::<i64>().ok().map(Value::Int)
}

fn parse_number(text: &str) -> Option<f64> {
    if !NUMBER.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

fn parse_boolean(text: &str) -> Option<Value> {
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn array_body(text: &str) -> Option<&str> {
    text.starts_with('[').then(|| enclosed_body(text, 0)).flatten()
}

fn object_body(text: &str) -> Option<&str> {
    text.starts_with('{').then(|| enclosed_body(text, 0)).flatten()
}

fn decode_elements(body: &str, item_type: Option<&str>) -> Result<Vec<Value>, ConversionError> {
    split_top_level(body, ',')?
        .into_iter()
        .map(|element| match item_type {
            Some(item_type) => JavaScriptDialect.decode(element, item_type, None),
            None => infer_literal(element),
        })
        .collect()
}

fn decode_object(body: &str, input: &str) -> Result<IndexMap<String, Value>, ConversionError> {
    let mut map = IndexMap::new();
    for entry in split_top_level(body, ',')? {
        let malformed = || ConversionError::MalformedEntry {
            entry: entry.to_string(),
            input: input.to_string(),
        };
        let (key, value) = split_once_top_level(entry, ':').ok_or_else(malformed)?;
        let key = match unquote(key, &QUOTES) {
            Some(key) => key,
            None if IDENTIFIER.is_match(key) || INTEGER.is_match(key) => key.to_string(),
            None => return Err(malformed()),
        };
        map.insert(key, infer_literal(value)?);
    }
    Ok(map)
}

/// Decodes a literal whose type is not declared. Identifiers and
/// expressions stay strings.
fn infer_literal(text: &str) -> Result<Value, ConversionError> {
    let text = text.trim();
    if text == "null" || text == "undefined" {
        return Ok(Value::None);
    }
    if let Some(value) = parse_boolean(text)
        .or_else(|| unquote(text, &QUOTES).map(Value::Str))
        .or_else(|| parse_integer(text, &INTEGER))
        .or_else(|| parse_number(text).map(Value::Float))
    {
        return Ok(value);
    }
    if let Some(body) = array_body(text) {
        return Ok(Value::List(decode_elements(body, None)?));
    }
    if let Some(body) = object_body(text) {
        return Ok(Value::Dict(decode_object(body, text)?));
    }
    Ok(Value::Str(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(raw: &str, declared: &str, item: Option<&str>) -> Value {
        JavaScriptDialect.decode(raw, declared, item).unwrap()
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode("'hello'", "String", None), Value::from("hello"));
        assert_eq!(decode("`tpl`", "String", None), Value::from("tpl"));
        assert_eq!(decode("12", "integer", None), Value::Int(12));
        assert_eq!(decode("9007199254740993n", "Bigint", None), Value::Int(9_007_199_254_740_993));
        assert_eq!(decode("2.5", "float", None), Value::Float(2.5));
        assert_eq!(decode("2", "float", None), Value::Float(2.0));
        assert_eq!(decode("false", "Boolean", None), Value::Bool(false));
    }

    #[test]
    fn identifiers_stay_strings() {
        assert_eq!(decode("userId", "integer", None), Value::from("userId"));
        assert_eq!(decode("document.title", "String", None), Value::from("document.title"));
        assert_eq!(decode("settings", "dict", None), Value::from("settings"));
    }

    #[test]
    fn decodes_arrays() {
        assert_eq!(
            decode("['a', 'b']", "array", Some("String")),
            Value::from(json!(["a", "b"]))
        );
        assert_eq!(
            decode("[1, 'x', [true]]", "array", None),
            Value::from(json!([1, "x", [true]]))
        );
    }

    #[test]
    fn decodes_objects() {
        assert_eq!(
            decode("{theme: 'dark', 'font-size': 12, nested: {on: true}}", "dict", None),
            Value::from(json!({"theme": "dark", "font-size": 12, "nested": {"on": true}}))
        );
        assert_eq!(decode("{}", "dict", None), Value::from(json!({})));
    }

    #[test]
    fn malformed_objects_are_errors() {
        assert!(JavaScriptDialect.decode("{a 1}", "dict", None).is_err());
        assert!(JavaScriptDialect.decode("{a: (1]}", "dict", None).is_err());
    }
}
