//! Function schemas offered to the model.
//!
//! A [`FunctionSchema`] declares one callable: its name, its parameters and
//! which of them are required. Parameter types are kept as the raw declared
//! strings (`"integer"`, `"ArrayList"`, `"Bigint"`, ...) because their meaning
//! depends on the dialect of the test item; resolution happens in the checker.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// The contract a candidate call must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,
}

/// The parameter block of a [`FunctionSchema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Usually `"dict"` or `"object"`; carried but not interpreted.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, ParamSpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// Declared type of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Declared type name in the item's dialect vocabulary.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Element type, present for collection types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Element type of a collection parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl FunctionSchema {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.properties.get(name)
    }

    pub fn required(&self) -> &[String] {
        &self.parameters.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.parameters.required.iter().any(|r| r == name)
    }
}

impl ParamSpec {
    /// Shorthand for a parameter without an element type.
    pub fn scalar(type_name: impl Into<String>) -> Self {
        ParamSpec {
            type_name: type_name.into(),
            items: None,
            description: None,
        }
    }

    /// Shorthand for a collection parameter with an element type.
    pub fn collection(type_name: impl Into<String>, item_type: impl Into<String>) -> Self {
        ParamSpec {
            type_name: type_name.into(),
            items: Some(ItemSpec {
                type_name: item_type.into(),
            }),
            description: None,
        }
    }

    /// The declared element type, if any.
    pub fn item_type(&self) -> Option<&str> {
        self.items
            .as_ref()
            .map(|items| items.type_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Looks up the schema that describes the ground-truth function `name`.
///
/// An exact name match wins; otherwise the first schema whose name is
/// contained in `name` is returned, which is how the reference data has
/// always been resolved.
pub fn find_schema<'a>(schemas: &'a [FunctionSchema], name: &str) -> Option<&'a FunctionSchema> {
    schemas
        .iter()
        .find(|schema| schema.name == name)
        .or_else(|| schemas.iter().find(|schema| name.contains(schema.name.as_str())))
}

/// Deserializes either a single schema object or an array of them.
///
/// Datasets store single-function items as a bare object.
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<FunctionSchema>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(FunctionSchema),
        Many(Vec<FunctionSchema>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(schema) => vec![schema],
        OneOrMany::Many(schemas) => schemas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> FunctionSchema {
        serde_json::from_value(json!({
            "name": "get_weather",
            "description": "Current weather for a city",
            "parameters": {
                "type": "dict",
                "properties": {
                    "location": {"type": "string", "description": "City and state"},
                    "days": {"type": "array", "items": {"type": "integer"}}
                },
                "required": ["location"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_dataset_shape() {
        let schema = weather_schema();
        assert!(schema.is_required("location"));
        assert!(!schema.is_required("days"));
        assert_eq!(schema.param("days").unwrap().item_type(), Some("integer"));
        assert_eq!(schema.param("location").unwrap().item_type(), None);
    }

    #[test]
    fn find_schema_prefers_exact_name() {
        let mut short = weather_schema();
        short.name = "get".into();
        let schemas = vec![short, weather_schema()];
        assert_eq!(find_schema(&schemas, "get_weather").unwrap().name, "get_weather");
    }

    #[test]
    fn find_schema_falls_back_to_containment() {
        let schemas = vec![weather_schema()];
        assert_eq!(
            find_schema(&schemas, "weather.get_weather").unwrap().name,
            "get_weather"
        );
        assert!(find_schema(&schemas, "get_forecast").is_none());
    }

    #[test]
    fn one_or_many_accepts_both_shapes() {
        #[derive(Deserialize)]
        struct Item {
            #[serde(deserialize_with = "one_or_many")]
            function: Vec<FunctionSchema>,
        }

        let single: Item = serde_json::from_value(json!({
            "function": {"name": "f", "parameters": {"properties": {}}}
        }))
        .unwrap();
        assert_eq!(single.function.len(), 1);

        let many: Item = serde_json::from_value(json!({
            "function": [{"name": "f"}, {"name": "g"}]
        }))
        .unwrap();
        assert_eq!(many.function.len(), 2);
    }
}
