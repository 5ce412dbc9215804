//! Java parameter typing and literal decoding.
//!
//! Candidates for Java items pass every argument as Java source text. The
//! decoder understands numeric and boolean literals, `'c'` chars, `"..."`
//! strings, array initializers (`new int[]{1, 2}`), list/set factories
//! (`new ArrayList<>(Arrays.asList(..))`, `List.of(..)`) and map
//! initializers (`new HashMap<>() {{ put(k, v); }}`, `Map.of(k, v)`).

use callcheck_core::{ErrorType, TestLanguage, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::literal::{enclosed_body, split_top_level, unquote};
use super::{CanonicalType, ConversionError, Dialect, NESTED_CONVERSION_TYPES};

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d+$").unwrap());
static LONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d+[lL]?$").unwrap());
static FLOATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\d+\.\d*|\.\d+|\d+)([eE][-+]?\d+)?[fFdD]?$").unwrap()
});

/// Factory calls whose arguments are the collection's elements.
const FACTORIES: [&str; 6] = [
    "Arrays.asList",
    "List.of",
    "Set.of",
    "Stream.of",
    "Collections.singletonList",
    "Collections.singleton",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaDialect;

impl Dialect for JavaDialect {
    fn language(&self) -> TestLanguage {
        TestLanguage::Java
    }

    fn resolve(&self, declared: &str) -> Option<CanonicalType> {
        let resolved = match declared {
            "byte" | "short" | "integer" | "long" => CanonicalType::Integer,
            "float" | "double" => CanonicalType::Float,
            "boolean" => CanonicalType::Boolean,
            "char" | "String" | "any" => CanonicalType::String,
            "Array" | "ArrayList" | "Queue" | "Stack" => CanonicalType::List,
            "Set" => CanonicalType::Set,
            "HashMap" | "Hashtable" => CanonicalType::Dict,
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
        let fallback = || Value::Str(raw.to_string());
        let value = match declared {
            "byte" | "short" | "integer" => parse_integer(text, &INTEGER),
            "long" => parse_integer(text, &LONG),
            "float" | "double" => parse_floating(text),
            "boolean" => parse_boolean(text),
            "char" => unquote(text, &['\'']).filter(|s| s.chars().count() == 1).map(Value::Str),
            "String" => unquote(text, &['"']).map(Value::Str),
            "Array" => match array_body(text) {
                Some(body) => Some(Value::List(decode_elements(body, item_type)?)),
                None => None,
            },
            "ArrayList" | "Queue" | "Stack" => match collection_body(text) {
                Some(body) => Some(Value::List(decode_elements(body, item_type)?)),
                None => None,
            },
            "Set" => match collection_body(text) {
                Some(body) => Some(Value::Set(decode_elements(body, item_type)?)),
                None => None,
            },
            "HashMap" | "Hashtable" => decode_map(text)?.map(Value::Dict),
            _ => None,
        };
        Ok(value.unwrap_or_else(fallback))
    }

    fn encoding_error(&self) -> ErrorType {
        ErrorType::TypeJava
    }
}

fn parse_integer(text: &str, pattern: &Regex) -> Option<Value> {
    if !pattern.is_match(text) {
        return None;
    }
    text.trim_end_matches(['l', 'L'])
        .trim_start_matches('+')
        .parse::<i64>()
        .ok()
        .map(Value::Int)
}

fn parse_floating(text: &str) -> Option<Value> {
    if !FLOATING.is_match(text) {
        return None;
    }
    text.trim_end_matches(['f', 'F', 'd', 'D'])
        .parse::<f64>()
        .ok()
        .map(Value::Float)
}

fn parse_boolean(text: &str) -> Option<Value> {
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Body of `new T[]{...}`, `new T[][]{...}` or a bare `{...}` initializer.
fn array_body(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let head = text[..open].trim();
    let is_initializer = head.is_empty() || (head.starts_with("new ") && head.ends_with(']'));
    if !is_initializer {
        return None;
    }
    enclosed_body(text, open)
}

/// Body of a list/set construction, unwrapping `new X<>(...)` around a
/// factory call. `new X<>()` yields an empty body.
fn collection_body(text: &str) -> Option<&str> {
    if let Some(rest) = text.strip_prefix("new ") {
        let open = text.len() - rest.len() + rest.find('(')?;
        let inner = enclosed_body(text, open)?.trim();
        if inner.is_empty() {
            return Some(inner);
        }
        return collection_body(inner);
    }
    FACTORIES.iter().find_map(|factory| {
        let rest = text.strip_prefix(factory)?;
        let open = text.len() - rest.trim_start().len();
        enclosed_body(text, open)
    })
}

fn decode_elements(body: &str, item_type: Option<&str>) -> Result<Vec<Value>, ConversionError> {
    split_top_level(body, ',')?
        .into_iter()
        .map(|element| match item_type {
            Some(item_type) => JavaDialect.decode(element, item_type, None),
            None => infer_literal(element),
        })
        .collect()
}

/// Decodes `new HashMap<..>() {{ put(k, v); ... }}`, `new HashMap<>()` and
/// `Map.of(k1, v1, ...)`. Returns `None` for text of any other shape.
fn decode_map(text: &str) -> Result<Option<IndexMap<String, Value>>, ConversionError> {
    if let Some(rest) = text.strip_prefix("Map.of") {
        let open = text.len() - rest.trim_start().len();
        let Some(body) = enclosed_body(text, open) else {
            return Ok(None);
        };
        let parts = split_top_level(body, ',')?;
        if parts.len() % 2 != 0 {
            return Err(ConversionError::MalformedEntry {
                entry: body.to_string(),
                input: text.to_string(),
            });
        }
        let mut map = IndexMap::new();
        for pair in parts.chunks(2) {
            map.insert(map_key(pair[0])?, infer_literal(pair[1])?);
        }
        return Ok(Some(map));
    }

    if !text.starts_with("new ") {
        return Ok(None);
    }
    let Some(brace) = text.find('{') else {
        // `new HashMap<>()` with no initializer block.
        return Ok(text.ends_with(')').then(IndexMap::new));
    };
    let Some(block) = enclosed_body(text, brace) else {
        return Ok(None);
    };
    let block = block.trim();
    let statements = match block.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        Some(statements) => statements,
        None => return Ok(None),
    };

    let mut map = IndexMap::new();
    for statement in split_top_level(statements, ';')? {
        let malformed = || ConversionError::MalformedEntry {
            entry: statement.to_string(),
            input: text.to_string(),
        };
        let args = statement
            .strip_prefix("put")
            .map(str::trim_start)
            .and_then(|rest| enclosed_body(rest, 0))
            .ok_or_else(malformed)?;
        let parts = split_top_level(args, ',')?;
        let [key, value] = parts.as_slice() else {
            return Err(malformed());
        };
        map.insert(map_key(key)?, infer_literal(value)?);
    }
    Ok(Some(map))
}

fn map_key(text: &str) -> Result<String, ConversionError> {
    Ok(match infer_literal(text)? {
        Value::Str(s) => s,
        other => other.to_string(),
    })
}

/// Decodes a literal whose type is not declared.
fn infer_literal(text: &str) -> Result<Value, ConversionError> {
    let text = text.trim();
    if text == "null" {
        return Ok(Value::None);
    }
    if let Some(value) = parse_boolean(text)
        .or_else(|| unquote(text, &['"', '\'']).map(Value::Str))
        .or_else(|| parse_integer(text, &LONG))
        .or_else(|| parse_floating(text))
    {
        return Ok(value);
    }
    if let Some(body) = array_body(text) {
        return Ok(Value::List(decode_elements(body, None)?));
    }
    if let Some(body) = collection_body(text) {
        return Ok(Value::List(decode_elements(body, None)?));
    }
    Ok(Value::Str(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(raw: &str, declared: &str, item: Option<&str>) -> Value {
        JavaDialect.decode(raw, declared, item).unwrap()
    }

    #[test]
    fn decodes_scalars() {
        assert_eq!(decode("42", "integer", None), Value::Int(42));
        assert_eq!(decode("-7", "short", None), Value::Int(-7));
        assert_eq!(decode("10000000000L", "long", None), Value::Int(10_000_000_000));
        assert_eq!(decode("1.5f", "float", None).kind(), callcheck_core::ValueKind::Float);
        assert_eq!(decode("3", "double", None), Value::Float(3.0));
        assert_eq!(decode("true", "boolean", None), Value::Bool(true));
        assert_eq!(decode("'x'", "char", None), Value::from("x"));
        assert_eq!(decode("\"hello\"", "String", None), Value::from("hello"));
    }

    #[test]
    fn non_literals_stay_strings() {
        assert_eq!(decode("maxRetries", "integer", None), Value::from("maxRetries"));
        assert_eq!(decode("userName", "String", None), Value::from("userName"));
        assert_eq!(decode("flag", "boolean", None), Value::from("flag"));
        assert_eq!(decode("items", "ArrayList", Some("String")), Value::from("items"));
    }

    #[test]
    fn decodes_arrays_with_element_type() {
        assert_eq!(
            decode("new int[]{1, 2, 3}", "Array", Some("integer")),
            Value::from(json!([1, 2, 3]))
        );
        assert_eq!(
            decode("new String[] {\"a\", \"b\"}", "Array", Some("String")),
            Value::from(json!(["a", "b"]))
        );
        assert_eq!(decode("new int[]{}", "Array", Some("integer")), Value::List(vec![]));
    }

    #[test]
    fn decodes_list_factories() {
        assert_eq!(
            decode(
                "new ArrayList<>(Arrays.asList(\"x\", \"y\"))",
                "ArrayList",
                Some("String")
            ),
            Value::from(json!(["x", "y"]))
        );
        assert_eq!(
            decode("List.of(1, 2)", "ArrayList", Some("integer")),
            Value::from(json!([1, 2]))
        );
        assert_eq!(decode("new ArrayList<>()", "ArrayList", Some("integer")), Value::List(vec![]));
    }

    #[test]
    fn decodes_sets_without_element_type() {
        assert_eq!(
            decode("new HashSet<>(Arrays.asList(\"a\", 1))", "Set", None),
            Value::Set(vec![Value::from("a"), Value::Int(1)])
        );
    }

    #[test]
    fn decodes_map_initializers() {
        let value = decode(
            "new HashMap<String, Integer>() {{ put(\"apples\", 3); put(\"pears\", 5); }}",
            "HashMap",
            None,
        );
        assert_eq!(value, Value::from(json!({"apples": 3, "pears": 5})));
        assert_eq!(
            decode("Map.of(\"k\", true)", "HashMap", None),
            Value::from(json!({"k": true}))
        );
        assert_eq!(decode("new HashMap<>()", "Hashtable", None), Value::from(json!({})));
    }

    #[test]
    fn malformed_collections_are_errors() {
        assert!(JavaDialect.decode("new int[]{1, (2]}", "Array", Some("integer")).is_err());
        assert!(JavaDialect
            .decode("new HashMap<>() {{ remove(\"k\"); }}", "HashMap", None)
            .is_err());
    }

    #[test]
    fn resolves_table() {
        assert_eq!(JavaDialect.resolve("Hashtable"), Some(CanonicalType::Dict));
        assert_eq!(JavaDialect.resolve("Set"), Some(CanonicalType::Set));
        assert_eq!(JavaDialect.resolve("int"), None);
        assert!(JavaDialect.is_nested("ArrayList"));
        assert!(!JavaDialect.is_nested("Set"));
    }
}
