//! Building Kubernetes objects from block values

use serde_json::{Map, Value};

use crate::catalog::ResourceType;
use crate::convert::to_wire;
use crate::error::{CoreError, Result};
use crate::model::Metadata;

/// Build the object sent to the cluster: `apiVersion`, `kind`, `metadata`, `spec`
///
/// Works for both resource and manifest blocks, provider-only attributes
/// (`id`, options, `yaml`) are never included.
pub fn build_object(rt: &ResourceType, block: &Value) -> Result<Value> {
    let schema = rt.resource_schema();

    let mut object = Map::new();
    object.insert("apiVersion".to_string(), Value::String(rt.api_version()));
    object.insert("kind".to_string(), Value::String(rt.kind.clone()));

    let metadata_attr = schema
        .attributes
        .get("metadata")
        .ok_or_else(|| CoreError::MissingField {
            field: "metadata".to_string(),
        })?;
    let metadata = block
        .get("metadata")
        .and_then(|m| to_wire(m, &metadata_attr.type_))
        .ok_or_else(|| CoreError::MissingField {
            field: "metadata".to_string(),
        })?;
    object.insert("metadata".to_string(), metadata);

    if let Some(spec_attr) = schema.attributes.get("spec")
        && let Some(spec) = block.get("spec").and_then(|s| to_wire(s, &spec_attr.type_))
    {
        object.insert("spec".to_string(), spec);
    }

    Ok(Value::Object(object))
}

/// Render a block as a YAML manifest
pub fn render_yaml(rt: &ResourceType, block: &Value) -> Result<String> {
    let object = build_object(rt, block)?;
    Ok(serde_yaml::to_string(&object)?)
}

/// State of a manifest data source: the configuration plus `id`, `api_version`, `kind` and `yaml`
pub fn manifest_state(rt: &ResourceType, block: &Value) -> Result<Value> {
    let id = Metadata::from_block(block)?.object_id().to_string();
    let yaml = render_yaml(rt, block)?;

    let mut state = match block {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    state.insert("id".to_string(), Value::String(id));
    state.insert("api_version".to_string(), Value::String(rt.api_version()));
    state.insert("kind".to_string(), Value::String(rt.kind.clone()));
    state.insert("yaml".to_string(), Value::String(yaml));
    Ok(Value::Object(state))
}
