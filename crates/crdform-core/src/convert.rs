//! Mapping between block values and Kubernetes objects
//!
//! Blocks use snake_case attribute names, objects use the JSON keys of the
//! CRD. Each translated attribute remembers its key in `wire_name`, so the
//! mapping is driven entirely by the block schema.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::{Attribute, AttributeType};

/// Convert a block value into its wire form
///
/// Null values are omitted, returning `None` for a null input.
pub fn to_wire(value: &Value, type_: &AttributeType) -> Option<Value> {
    if value.is_null() {
        return None;
    }

    let converted = match (type_, value) {
        (AttributeType::List(element), Value::Array(items)) => Value::Array(
            items
                .iter()
                .filter_map(|item| to_wire(item, element))
                .collect(),
        ),
        (AttributeType::Map(element), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .filter_map(|(k, v)| to_wire(v, element).map(|v| (k.clone(), v)))
                .collect(),
        ),
        (AttributeType::Object(attrs), Value::Object(_)) => {
            Value::Object(to_wire_object(value, attrs))
        }
        _ => value.clone(),
    };

    Some(converted)
}

/// Convert the attributes of an object value, skipping provider-only attributes
pub fn to_wire_object(value: &Value, attrs: &BTreeMap<String, Attribute>) -> Map<String, Value> {
    let mut object = Map::new();
    for (name, attr) in attrs {
        let Some(wire_name) = attr.wire_name.as_deref() else {
            continue;
        };
        if let Some(v) = value.get(name).and_then(|v| to_wire(v, &attr.type_)) {
            object.insert(wire_name.to_string(), v);
        }
    }
    object
}

/// Convert a wire value back into block form
///
/// Every declared object attribute is present in the result, null when the
/// object does not carry it. Fields the schema does not declare are dropped.
pub fn from_wire(value: Option<&Value>, type_: &AttributeType) -> Value {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Value::Null;
    };

    match (type_, value) {
        (AttributeType::List(element), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| from_wire(Some(item), element))
                .collect(),
        ),
        (AttributeType::Map(element), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), from_wire(Some(v), element)))
                .collect(),
        ),
        (AttributeType::Object(attrs), Value::Object(_)) => from_wire_object(value, attrs),
        _ => value.clone(),
    }
}

/// Convert an object back into block form, filling only attributes with a wire name
pub fn from_wire_object(value: &Value, attrs: &BTreeMap<String, Attribute>) -> Value {
    let mut object = Map::new();
    for (name, attr) in attrs {
        let Some(wire_name) = attr.wire_name.as_deref() else {
            continue;
        };
        object.insert(name.clone(), from_wire(value.get(wire_name), &attr.type_));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec_type() -> AttributeType {
        let mut backend = BTreeMap::new();
        backend.insert(
            "url".to_string(),
            Attribute::optional(AttributeType::String).wire("url"),
        );
        backend.insert(
            "tls_ca_path".to_string(),
            Attribute::optional(AttributeType::String).wire("tlsCAPath"),
        );

        let mut spec = BTreeMap::new();
        spec.insert(
            "max_replicas".to_string(),
            Attribute::optional(AttributeType::Int64).wire("maxReplicas"),
        );
        spec.insert(
            "backends".to_string(),
            Attribute::optional(AttributeType::list(AttributeType::Object(backend))).wire("backends"),
        );
        spec.insert(
            "env".to_string(),
            Attribute::optional(AttributeType::map(AttributeType::String)).wire("env"),
        );
        spec.insert(
            "template".to_string(),
            Attribute::optional(AttributeType::Dynamic).wire("template"),
        );
        AttributeType::Object(spec)
    }

    #[test]
    fn test_to_wire_renames_and_drops_nulls() {
        let block = json!({
            "max_replicas": 3,
            "backends": [{"url": "https://a", "tls_ca_path": null}],
            "env": {"LOG_LEVEL": "debug", "unset": null},
            "template": {"someField": {"keep": "as-is"}}
        });

        let wire = to_wire(&block, &spec_type()).unwrap();
        assert_eq!(
            wire,
            json!({
                "maxReplicas": 3,
                "backends": [{"url": "https://a"}],
                "env": {"LOG_LEVEL": "debug"},
                "template": {"someField": {"keep": "as-is"}}
            })
        );
    }

    #[test]
    fn test_to_wire_null_is_omitted() {
        assert_eq!(to_wire(&Value::Null, &spec_type()), None);
    }

    #[test]
    fn test_from_wire_fills_declared_attributes() {
        let wire = json!({
            "maxReplicas": 5,
            "backends": [{"tlsCAPath": "/ca"}],
            "unknownField": true
        });

        let block = from_wire(Some(&wire), &spec_type());
        assert_eq!(
            block,
            json!({
                "max_replicas": 5,
                "backends": [{"url": null, "tls_ca_path": "/ca"}],
                "env": null,
                "template": null
            })
        );
    }

    #[test]
    fn test_round_trip_preserves_configured_values() {
        let block = json!({
            "max_replicas": 1,
            "backends": [{"url": "https://b", "tls_ca_path": "/etc/ca"}],
            "env": {"A": "1"},
            "template": [1, "two"]
        });
        let ty = spec_type();
        let wire = to_wire(&block, &ty).unwrap();
        assert_eq!(from_wire(Some(&wire), &ty), block);
    }

    #[test]
    fn test_provider_only_attributes_are_not_sent() {
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), Attribute::computed(AttributeType::String));
        attrs.insert(
            "spec".to_string(),
            Attribute::optional(AttributeType::Dynamic).wire("spec"),
        );

        let wire = to_wire_object(&json!({"id": "default/x", "spec": {"a": 1}}), &attrs);
        assert_eq!(Value::Object(wire), json!({"spec": {"a": 1}}));

        let back = from_wire_object(&json!({"spec": {"a": 1}, "status": {}}), &attrs);
        assert_eq!(back, json!({"spec": {"a": 1}}));
    }
}
