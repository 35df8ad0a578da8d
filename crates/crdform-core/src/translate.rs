//! CRD OpenAPI schema to block schema translation
//!
//! One generic translation replaces hand-written per-resource schemas: every
//! block of every resource type is derived from the parsed CRD here.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::crd::{AdditionalProperties, CrdVersionSchema, PropertyType, SchemaProperty};
use crate::model::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_WAIT_TIMEOUT_SECS, DeletionPropagation};
use crate::naming::to_snake_case;
use crate::schema::{Attribute, AttributeType, Schema, Validator};

/// Translate a single OpenAPI property into an attribute
pub fn translate_property(wire_name: &str, prop: &SchemaProperty, required: bool) -> Attribute {
    let type_ = translate_type(prop);
    let attr = if required {
        Attribute::required(type_)
    } else {
        Attribute::optional(type_)
    };

    attr.wire(wire_name).describe(property_description(prop))
}

/// Translate the shape of an OpenAPI property into an attribute type
pub fn translate_type(prop: &SchemaProperty) -> AttributeType {
    if prop.is_opaque() {
        return AttributeType::Dynamic;
    }

    match &prop.type_ {
        PropertyType::String => AttributeType::String,
        PropertyType::Integer => AttributeType::Int64,
        PropertyType::Number => AttributeType::Float64,
        PropertyType::Boolean => AttributeType::Bool,
        PropertyType::Array => AttributeType::list(
            prop.items
                .as_deref()
                .map(translate_type)
                .unwrap_or(AttributeType::Dynamic),
        ),
        PropertyType::Object | PropertyType::Unspecified => {
            if prop.has_nested_properties() {
                AttributeType::Object(translate_object(prop))
            } else if let Some(AdditionalProperties::Schema(values)) = &prop.additional_properties
            {
                AttributeType::map(translate_type(values))
            } else if prop.type_ == PropertyType::Object {
                AttributeType::map(AttributeType::String)
            } else {
                AttributeType::Dynamic
            }
        }
        PropertyType::Unknown(_) => AttributeType::Dynamic,
    }
}

/// Translate the nested properties of an object property
pub fn translate_object(prop: &SchemaProperty) -> BTreeMap<String, Attribute> {
    let mut attributes = BTreeMap::new();

    let Some(properties) = &prop.properties else {
        return attributes;
    };

    for (wire_name, child) in properties {
        let name = to_snake_case(wire_name);
        if attributes.contains_key(&name) {
            tracing::warn!(
                attribute = %name,
                wire_name = %wire_name,
                "attribute name collision, keeping the first property"
            );
            continue;
        }
        let attr = translate_property(wire_name, child, prop.is_required(wire_name));
        attributes.insert(name, attr);
    }

    attributes
}

fn property_description(prop: &SchemaProperty) -> String {
    let mut description = prop.description.clone().unwrap_or_default();
    if let Some(default) = &prop.default {
        if !description.is_empty() && !description.ends_with(['.', '\n']) {
            description.push('.');
        }
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&format!("Defaults to {}.", default));
    }
    description
}

/// Identity attributes shared by every block: `id`, `api_version`, `kind`
fn identity_attributes(attributes: &mut BTreeMap<String, Attribute>, namespaced: bool) {
    let id_description = if namespaced {
        "Contains the value `metadata.namespace/metadata.name`."
    } else {
        "Contains the value `metadata.name`."
    };
    attributes.insert(
        "id".to_string(),
        Attribute::computed(AttributeType::String).describe(id_description),
    );
    attributes.insert(
        "api_version".to_string(),
        Attribute::computed(AttributeType::String)
            .wire("apiVersion")
            .describe("The API group and version of the object, e.g. 'loki.grafana.com/v1'."),
    );
    attributes.insert(
        "kind".to_string(),
        Attribute::computed(AttributeType::String)
            .wire("kind")
            .describe("Kind of the object, e.g. 'LokiStack'."),
    );
}

fn metadata_attribute(namespaced: bool, read_only: bool) -> Attribute {
    let mut attrs = BTreeMap::new();

    attrs.insert(
        "name".to_string(),
        Attribute::required(AttributeType::String)
            .wire("name")
            .describe("Unique name of this object within its namespace.")
            .with_validator(Validator::length(1, Some(253))),
    );

    if namespaced {
        attrs.insert(
            "namespace".to_string(),
            Attribute::required(AttributeType::String)
                .wire("namespace")
                .describe("Namespace the object lives in.")
                .with_validator(Validator::length(1, Some(63))),
        );
    }

    let map_attr = |description: &str| {
        let attr = if read_only {
            Attribute::computed(AttributeType::map(AttributeType::String))
        } else {
            Attribute::optional(AttributeType::map(AttributeType::String))
        };
        attr.describe(description)
    };
    attrs.insert(
        "labels".to_string(),
        map_attr("Map of string keys and values used to organize and categorize objects.")
            .wire("labels"),
    );
    attrs.insert(
        "annotations".to_string(),
        map_attr("Unstructured key value map stored with the object.").wire("annotations"),
    );

    Attribute::required(AttributeType::Object(attrs))
        .wire("metadata")
        .describe("Data that helps uniquely identify this object.")
}

/// The `spec` attribute of a version, if the version declares one
pub fn spec_attribute(version: &CrdVersionSchema) -> Option<Attribute> {
    match &version.schema {
        None => Some(
            Attribute::optional(AttributeType::Dynamic)
                .wire("spec")
                .describe("Free-form specification of the object."),
        ),
        Some(_) => version
            .spec_schema()
            .map(|spec| translate_property("spec", spec, version.spec_required())),
    }
}

fn wait_attributes(with_expectation: bool) -> BTreeMap<String, Attribute> {
    let mut attrs = BTreeMap::new();

    if with_expectation {
        attrs.insert(
            "jsonpath".to_string(),
            Attribute::required(AttributeType::String)
                .describe("JSONPath expression evaluated against the object, e.g. '.status.phase'.")
                .with_validator(Validator::JsonPath),
        );
        attrs.insert(
            "value".to_string(),
            Attribute::required(AttributeType::String)
                .describe("Value the JSONPath expression must produce."),
        );
    }

    attrs.insert(
        "timeout".to_string(),
        Attribute::optional(AttributeType::Int64)
            .describe(format!(
                "Seconds to wait before giving up. Defaults to {}.",
                DEFAULT_WAIT_TIMEOUT_SECS
            ))
            .with_default(json!(DEFAULT_WAIT_TIMEOUT_SECS))
            .with_validator(Validator::at_least(0)),
    );
    attrs.insert(
        "poll_interval".to_string(),
        Attribute::optional(AttributeType::Int64)
            .describe(format!(
                "Seconds to wait between checks. Defaults to {}.",
                DEFAULT_POLL_INTERVAL_SECS
            ))
            .with_default(json!(DEFAULT_POLL_INTERVAL_SECS))
            .with_validator(Validator::at_least(0)),
    );

    attrs
}

fn option_attributes(attributes: &mut BTreeMap<String, Attribute>) {
    attributes.insert(
        "force_conflicts".to_string(),
        Attribute::optional(AttributeType::Bool)
            .describe("If 'true', server-side apply will force the changes against conflicts.")
            .with_default(Value::Bool(false)),
    );
    attributes.insert(
        "field_manager".to_string(),
        Attribute::optional(AttributeType::String)
            .describe("The name of the manager used to track field ownership.")
            .with_validator(Validator::length(1, None)),
    );
    attributes.insert(
        "deletion_propagation".to_string(),
        Attribute::optional(AttributeType::String)
            .describe("Decides if a deletion will propagate to the dependents of the object, and how the garbage collector will handle the propagation.")
            .with_default(Value::String(DeletionPropagation::default().to_string()))
            .with_validator(Validator::one_of_strings(&DeletionPropagation::VALUES)),
    );
    attributes.insert(
        "wait_for_upsert".to_string(),
        Attribute::optional(AttributeType::list(AttributeType::Object(wait_attributes(
            true,
        ))))
        .describe("Wait for these conditions after the object was created or updated."),
    );
    attributes.insert(
        "wait_for_delete".to_string(),
        Attribute::optional(AttributeType::Object(wait_attributes(false)))
            .describe("Wait until the object was removed from the cluster after deleting it."),
    );
}

fn block_description(kind: &str, api_version: &str, version: &CrdVersionSchema) -> String {
    match version.description() {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => format!("{} ({})", kind, api_version),
    }
}

/// Schema of the `resource` block
pub fn resource_schema(
    kind: &str,
    api_version: &str,
    namespaced: bool,
    version: &CrdVersionSchema,
) -> Schema {
    let mut attributes = BTreeMap::new();
    identity_attributes(&mut attributes, namespaced);
    attributes.insert("metadata".to_string(), metadata_attribute(namespaced, false));
    if let Some(spec) = spec_attribute(version) {
        attributes.insert("spec".to_string(), spec);
    }
    option_attributes(&mut attributes);

    let description = block_description(kind, api_version, version);
    Schema {
        markdown_description: description.clone(),
        description,
        attributes,
    }
}

/// Schema of the `data` block: identity in, everything else read from the cluster
pub fn data_source_schema(
    kind: &str,
    api_version: &str,
    namespaced: bool,
    version: &CrdVersionSchema,
) -> Schema {
    let mut attributes = BTreeMap::new();
    identity_attributes(&mut attributes, namespaced);
    attributes.insert("metadata".to_string(), metadata_attribute(namespaced, true));
    if let Some(spec) = spec_attribute(version) {
        attributes.insert("spec".to_string(), spec.into_computed());
    }

    let description = block_description(kind, api_version, version);
    Schema {
        markdown_description: description.clone(),
        description,
        attributes,
    }
}

/// Schema of the `_manifest` data block: the resource shape plus the rendered YAML
pub fn manifest_schema(
    kind: &str,
    api_version: &str,
    namespaced: bool,
    version: &CrdVersionSchema,
) -> Schema {
    let mut attributes = BTreeMap::new();
    identity_attributes(&mut attributes, namespaced);
    attributes.insert("metadata".to_string(), metadata_attribute(namespaced, false));
    if let Some(spec) = spec_attribute(version) {
        attributes.insert("spec".to_string(), spec);
    }
    attributes.insert(
        "yaml".to_string(),
        Attribute::computed(AttributeType::String)
            .describe("The generated manifest in YAML format."),
    );

    let description = format!(
        "Renders a {} ({}) manifest as YAML without contacting the cluster.",
        kind, api_version
    );
    Schema {
        markdown_description: description.clone(),
        description,
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdParser;

    const CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Namespaced
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: string
                  enum: [small, large]
                maxReplicas:
                  type: integer
                  minimum: 1
                  default: 3
                name:
                  type: string
                  pattern: '^[a-z]+$'
                  maxLength: 10
                tags:
                  type: array
                  maxItems: 2
                  items:
                    type: string
                env:
                  type: object
                  additionalProperties:
                    type: string
                port:
                  x-kubernetes-int-or-string: true
                ratio:
                  type: number
                backends:
                  type: array
                  items:
                    type: object
                    properties:
                      url:
                        type: string
            status:
              type: object
"#;

    fn version() -> CrdVersionSchema {
        CrdParser::parse(CRD).unwrap().versions.remove(0)
    }

    fn spec_attrs(schema: &Schema) -> &BTreeMap<String, Attribute> {
        match &schema.attributes["spec"].type_ {
            AttributeType::Object(attrs) => attrs,
            other => panic!("unexpected spec type {:?}", other),
        }
    }

    #[test]
    fn test_resource_schema_envelope() {
        let schema = resource_schema("Widget", "example.com/v1", true, &version());

        for computed in ["id", "api_version", "kind"] {
            assert!(schema.attributes[computed].computed, "{} computed", computed);
        }
        assert!(schema.attribute("metadata").unwrap().required);
        assert!(schema.attribute("metadata.name").unwrap().required);
        assert!(schema.attribute("metadata.namespace").unwrap().required);
        assert!(schema.attribute("metadata.labels").unwrap().optional);
        assert!(!schema.attributes.contains_key("status"));

        for option in crate::model::ResourceOptions::ATTRIBUTES {
            let attr = &schema.attributes[option];
            assert!(attr.optional, "{} optional", option);
            assert!(attr.wire_name.is_none(), "{} is not sent to the cluster", option);
        }
    }

    #[test]
    fn test_spec_translation() {
        let schema = resource_schema("Widget", "example.com/v1", true, &version());
        let spec = &schema.attributes["spec"];
        assert!(spec.optional, "spec is not required by the CRD");

        let attrs = spec_attrs(&schema);
        assert!(attrs["size"].required);

        let replicas = &attrs["max_replicas"];
        assert_eq!(replicas.wire_name.as_deref(), Some("maxReplicas"));
        assert!(matches!(replicas.type_, AttributeType::Int64));
        assert!(replicas.description.contains("Defaults to 3."));

        // CRD value constraints are checked against the CRD schema, not copied
        assert!(attrs.values().all(|a| a.validators.is_empty()));
        assert!(matches!(&attrs["tags"].type_, AttributeType::List(e) if matches!(**e, AttributeType::String)));
        assert!(matches!(&attrs["env"].type_, AttributeType::Map(e) if matches!(**e, AttributeType::String)));
        assert!(matches!(attrs["port"].type_, AttributeType::Dynamic));
        assert!(matches!(attrs["ratio"].type_, AttributeType::Float64));
        assert!(matches!(&attrs["backends"].type_, AttributeType::List(e) if matches!(**e, AttributeType::Object(_))));
    }

    #[test]
    fn test_data_source_schema_is_read_only() {
        let schema = data_source_schema("Widget", "example.com/v1", true, &version());

        assert!(schema.attribute("metadata.name").unwrap().required);
        assert!(schema.attribute("metadata.labels").unwrap().computed);
        assert!(!schema.attributes.contains_key("force_conflicts"));

        let spec = &schema.attributes["spec"];
        assert!(spec.computed && !spec.optional);
        let attrs = spec_attrs(&schema);
        assert!(attrs["size"].computed && !attrs["size"].required);
    }

    #[test]
    fn test_manifest_schema() {
        let schema = manifest_schema("Widget", "example.com/v1", false, &version());
        assert!(schema.description.contains("Widget (example.com/v1)"));
        assert!(schema.attributes["yaml"].computed);
        assert!(schema.attribute("metadata.namespace").is_none());
        assert!(!schema.attributes.contains_key("wait_for_delete"));
    }

    #[test]
    fn test_version_without_schema_gets_dynamic_spec() {
        let version = CrdVersionSchema {
            name: "v1".to_string(),
            served: true,
            storage: true,
            deprecated: false,
            deprecation_warning: None,
            schema: None,
            raw_spec: None,
        };
        let spec = spec_attribute(&version).unwrap();
        assert!(matches!(spec.type_, AttributeType::Dynamic));
    }

    #[test]
    fn test_plain_object_becomes_string_map() {
        let prop = SchemaProperty {
            type_: PropertyType::Object,
            ..Default::default()
        };
        assert!(matches!(translate_type(&prop), AttributeType::Map(_)));

        let untyped = SchemaProperty::default();
        assert!(matches!(translate_type(&untyped), AttributeType::Dynamic));
    }

    #[test]
    fn test_name_collision_keeps_first() {
        let typed = |type_| SchemaProperty {
            type_,
            ..Default::default()
        };
        let mut props = BTreeMap::new();
        props.insert("fooBar".to_string(), typed(PropertyType::String));
        props.insert("foo_bar".to_string(), typed(PropertyType::Integer));
        let object = SchemaProperty {
            properties: Some(props),
            ..typed(PropertyType::Object)
        };
        let attrs = translate_object(&object);

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["foo_bar"].wire_name.as_deref(), Some("fooBar"));
    }
}
