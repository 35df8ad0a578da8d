//! Provider-side block schemas
//!
//! A [`Schema`] describes one block (resource, data source or manifest data
//! source) as a tree of [`Attribute`]s. Attributes that mirror a Kubernetes
//! field remember the original JSON key in `wire_name`, which is what the
//! value mapping in [`crate::convert`] uses to translate in both directions.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::jsonpath::JsonPath;
use crate::validate::format_validation_error;

/// Schema of a single block
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub description: String,
    pub markdown_description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// Look up an attribute by dot-separated path (`metadata.name`)
    pub fn attribute(&self, path: &str) -> Option<&Attribute> {
        let mut parts = path.split('.');
        let mut current = self.attributes.get(parts.next()?)?;
        for part in parts {
            current = match &current.type_ {
                AttributeType::Object(attrs) => attrs.get(part)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// A single attribute of a block
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    /// JSON key in the Kubernetes object, `None` for provider-only attributes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<String>,
    pub description: String,
    pub markdown_description: String,
    #[serde(rename = "type")]
    pub type_: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_validators"
    )]
    pub validators: Vec<Validator>,
}

impl Attribute {
    fn new(type_: AttributeType, required: bool, optional: bool, computed: bool) -> Self {
        Self {
            wire_name: None,
            description: String::new(),
            markdown_description: String::new(),
            type_,
            required,
            optional,
            computed,
            sensitive: false,
            default: None,
            validators: Vec::new(),
        }
    }

    pub fn required(type_: AttributeType) -> Self {
        Self::new(type_, true, false, false)
    }

    pub fn optional(type_: AttributeType) -> Self {
        Self::new(type_, false, true, false)
    }

    pub fn computed(type_: AttributeType) -> Self {
        Self::new(type_, false, false, true)
    }

    /// Set both plain and markdown descriptions
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.markdown_description = description.clone();
        self.description = description;
        self
    }

    pub fn wire(mut self, name: impl Into<String>) -> Self {
        self.wire_name = Some(name.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Turn this attribute (and everything below it) into a read-only one
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.default = None;
        self.validators.clear();
        self.type_ = self.type_.into_computed();
        self
    }
}

/// Attribute value type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int64,
    Float64,
    Bool,
    /// Any JSON value, passed through without mapping
    Dynamic,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(BTreeMap<String, Attribute>),
}

impl AttributeType {
    pub fn list(element: AttributeType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(element: AttributeType) -> Self {
        Self::Map(Box::new(element))
    }

    /// Short human readable name, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "number (int64)",
            Self::Float64 => "number",
            Self::Bool => "bool",
            Self::Dynamic => "dynamic",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    fn into_computed(self) -> Self {
        match self {
            Self::List(element) => Self::List(Box::new(element.into_computed())),
            Self::Map(element) => Self::Map(Box::new(element.into_computed())),
            Self::Object(attrs) => Self::Object(
                attrs
                    .into_iter()
                    .map(|(name, attr)| (name, attr.into_computed()))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Value rules of provider attributes
///
/// Constraints of CRD fields are not copied here, they are checked against
/// the CRD schema itself (see [`crate::validate::SpecConstraints`]).
#[derive(Debug, Clone)]
pub enum Validator {
    /// JSON Schema keywords the value must satisfy, e.g. `{"minLength": 1}`
    Keywords(Value),
    /// String must be a parseable JSONPath expression
    JsonPath,
}

impl Validator {
    pub fn at_least(min: i64) -> Self {
        Self::Keywords(json!({ "minimum": min }))
    }

    pub fn one_of_strings(values: &[&str]) -> Self {
        Self::Keywords(json!({ "enum": values }))
    }

    /// String length bounds (characters)
    pub fn length(min: u64, max: Option<u64>) -> Self {
        let mut keywords = Map::new();
        if let Some(max) = max {
            keywords.insert("maxLength".to_string(), max.into());
        }
        keywords.insert("minLength".to_string(), min.into());
        Self::Keywords(Value::Object(keywords))
    }

    /// Check a (non-null) value, returning a message describing the violation
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            Self::Keywords(keywords) => {
                let validator = jsonschema::draft4::new(keywords)
                    .map_err(|e| format!("invalid validator {}: {}", keywords, e))?;
                let message = validator
                    .iter_errors(value)
                    .next()
                    .map(|e| format_validation_error(&e));
                message.map_or(Ok(()), Err)
            }
            Self::JsonPath => match value.as_str() {
                Some(expr) => JsonPath::parse(expr).map(|_| ()).map_err(|e| e.to_string()),
                None => Ok(()),
            },
        }
    }

    /// Human readable description, used in schema output
    pub fn describe(&self) -> String {
        match self {
            Self::Keywords(Value::Object(keywords)) => keywords
                .iter()
                .map(|(keyword, value)| format!("{}: {}", keyword, value))
                .collect::<Vec<_>>()
                .join(", "),
            Self::Keywords(other) => other.to_string(),
            Self::JsonPath => "valid JSONPath expression".to_string(),
        }
    }
}

fn serialize_validators<S: Serializer>(
    validators: &[Validator],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(validators.iter().map(Validator::describe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_of_validator() {
        let v = Validator::one_of_strings(&["Orphan", "Background", "Foreground"]);
        assert!(v.check(&json!("Orphan")).is_ok());
        let err = v.check(&json!("Later")).unwrap_err();
        assert!(err.contains("'Later'"), "{}", err);
        assert!(err.contains("Foreground"), "{}", err);
    }

    #[test]
    fn test_minimum_validator() {
        let v = Validator::at_least(0);
        assert!(v.check(&json!(0)).is_ok());
        assert!(v.check(&json!(-1)).is_err());
        // Keywords only apply to their own type, type checking happens elsewhere
        assert!(v.check(&json!("-1")).is_ok());
    }

    #[test]
    fn test_length_validator() {
        let bounded = Validator::length(1, Some(3));
        assert!(bounded.check(&json!("ab")).is_ok());
        assert!(bounded.check(&json!("")).is_err());
        assert!(bounded.check(&json!("abcd")).is_err());

        let open = Validator::length(1, None);
        assert!(open.check(&json!("a".repeat(300))).is_ok());
        assert_eq!(open.describe(), "minLength: 1");
    }

    #[test]
    fn test_jsonpath_validator() {
        assert!(Validator::JsonPath.check(&json!(".status.phase")).is_ok());
        assert!(Validator::JsonPath.check(&json!(".status[")).is_err());
    }

    #[test]
    fn test_into_computed_clears_flags_recursively() {
        let mut nested = BTreeMap::new();
        nested.insert(
            "policy".to_string(),
            Attribute::required(AttributeType::String)
                .with_validator(Validator::one_of_strings(&["Allow"])),
        );
        let attr = Attribute::optional(AttributeType::Object(nested)).into_computed();

        assert!(attr.computed && !attr.optional && !attr.required);
        let AttributeType::Object(children) = &attr.type_ else {
            panic!("expected object");
        };
        let policy = &children["policy"];
        assert!(policy.computed && !policy.required);
        assert!(policy.validators.is_empty());
    }

    #[test]
    fn test_schema_attribute_lookup() {
        let mut metadata = BTreeMap::new();
        metadata.insert("name".to_string(), Attribute::required(AttributeType::String));
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "metadata".to_string(),
            Attribute::required(AttributeType::Object(metadata)),
        );
        let schema = Schema {
            description: String::new(),
            markdown_description: String::new(),
            attributes,
        };

        assert!(schema.attribute("metadata.name").unwrap().required);
        assert!(schema.attribute("metadata.namespace").is_none());
        assert!(schema.attribute("spec").is_none());
    }

    #[test]
    fn test_schema_serializes_validators_as_text() {
        let attr = Attribute::optional(AttributeType::Int64)
            .describe("Timeout in seconds")
            .with_validator(Validator::at_least(0));
        let json = serde_json::to_value(&attr).unwrap();
        assert_eq!(json["type"], "int64");
        assert_eq!(json["validators"][0], "minimum: 0");
        assert!(json.get("wire_name").is_none());
    }
}
