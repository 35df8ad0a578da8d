//! Configuration validation against block schemas
//!
//! Validation runs in two layers. [`validate_block`] checks the shape of a
//! block against its provider schema. [`SpecConstraints`] then checks the
//! wire form of `spec` against the CRD's own OpenAPI schema with `jsonschema`,
//! so every keyword the API server enforces is enforced locally too.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::convert::to_wire;
use crate::diag::{Diagnostic, Diagnostics};
use crate::error::{CoreError, Result};
use crate::schema::{Attribute, AttributeType, Schema};

/// Validate a block configuration
///
/// Reports missing required attributes, unknown attributes, values set on
/// read-only attributes, type mismatches and validator failures. Every
/// diagnostic carries the path of the offending attribute.
pub fn validate_block(config: &Value, schema: &Schema) -> Diagnostics {
    let mut diags = Diagnostics::new();

    if !config.is_object() {
        diags.add_error(
            "Invalid Configuration",
            format!("block must be an object, got {}", kind_of(config)),
        );
        return diags;
    }

    validate_object("", config, &schema.attributes, &mut diags);
    diags
}

fn validate_object(
    prefix: &str,
    value: &Value,
    attrs: &BTreeMap<String, Attribute>,
    diags: &mut Diagnostics,
) {
    let Some(object) = value.as_object() else {
        return;
    };

    for key in object.keys() {
        if !attrs.contains_key(key) {
            diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named {:?} is not expected here.", key),
                )
                .at(join(prefix, key)),
            );
        }
    }

    for (name, attr) in attrs {
        validate_attribute(&join(prefix, name), object.get(name), attr, diags);
    }
}

fn validate_attribute(path: &str, value: Option<&Value>, attr: &Attribute, diags: &mut Diagnostics) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        if attr.required {
            diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument {:?} is required, but no definition was found.", path),
                )
                .at(path),
            );
        }
        return;
    };

    if attr.computed && !attr.optional && !attr.required {
        diags.push(
            Diagnostic::error(
                "Invalid Configuration for Read-Only Attribute",
                format!("Cannot set value for {:?}, it is computed by the provider.", path),
            )
            .at(path),
        );
        return;
    }

    if !check_type(path, value, &attr.type_, diags) {
        return;
    }

    for validator in &attr.validators {
        if let Err(message) = validator.check(value) {
            diags.push(Diagnostic::error("Invalid Attribute Value", message).at(path));
        }
    }
}

/// Check the shape of a value, recursing into containers. Returns whether the
/// value itself has the expected type.
fn check_type(path: &str, value: &Value, type_: &AttributeType, diags: &mut Diagnostics) -> bool {
    let ok = match type_ {
        AttributeType::Dynamic => true,
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => value.is_i64() || value.is_u64(),
        AttributeType::Float64 => value.is_number(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::List(element) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    if item.is_null() {
                        diags.push(
                            Diagnostic::error("Invalid Attribute Value", "list elements must not be null")
                                .at(item_path),
                        );
                    } else {
                        check_type(&item_path, item, element, diags);
                    }
                }
                true
            }
            None => false,
        },
        AttributeType::Map(element) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    if !item.is_null() {
                        check_type(&format!("{}[{:?}]", path, key), item, element, diags);
                    }
                }
                true
            }
            None => false,
        },
        AttributeType::Object(attrs) => {
            if value.is_object() {
                validate_object(path, value, attrs, diags);
                true
            } else {
                false
            }
        }
    };

    if !ok {
        diags.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!("expected {}, got {}", type_.type_name(), kind_of(value)),
            )
            .at(path),
        );
    }
    ok
}

/// Compiled OpenAPI schema of a CRD version's `spec`
#[derive(Clone)]
pub struct SpecConstraints {
    compiled: Arc<jsonschema::Validator>,
}

impl SpecConstraints {
    /// Compile the `spec` subtree of an `openAPIV3Schema`
    ///
    /// CRD schemas are OpenAPI v3.0, whose keywords follow JSON Schema draft 4
    /// (boolean `exclusiveMinimum`, ...). `x-kubernetes-*` extensions are ignored.
    pub fn compile(schema: &Value) -> Result<Self> {
        let compiled = jsonschema::draft4::new(schema).map_err(|e| CoreError::InvalidCrd {
            message: format!("Invalid spec schema: {}", e),
        })?;
        Ok(Self {
            compiled: Arc::new(compiled),
        })
    }

    /// Check a configured `spec` value, pushing one diagnostic per violation
    ///
    /// Paths are reported in attribute form (`spec.template.max_attempts`).
    /// Type and required violations below typed attributes are skipped, the
    /// block validation already reported them. A violation at a path that
    /// already has a diagnostic is not reported twice.
    pub fn check(&self, spec: &Attribute, value: &Value, diags: &mut Diagnostics) {
        let Some(wire) = to_wire(value, &spec.type_) else {
            return;
        };
        let reported: Vec<String> = diags.iter().filter_map(|d| d.path.clone()).collect();

        for error in self.compiled.iter_errors(&wire) {
            let pointer = error.instance_path.to_string();
            let (path, typed) = attribute_path("spec", &spec.type_, &pointer);
            let structural = matches!(
                error.kind,
                ValidationErrorKind::Type { .. } | ValidationErrorKind::Required { .. }
            );
            if (typed && structural) || reported.contains(&path) {
                continue;
            }
            diags.push(
                Diagnostic::error("Invalid Attribute Value", format_validation_error(&error))
                    .at(path),
            );
        }
    }
}

impl std::fmt::Debug for SpecConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecConstraints").finish_non_exhaustive()
    }
}

/// Translate a JSON pointer into the wire value of `type_` back into an
/// attribute path. The flag tells whether the pointer ended on a typed
/// (non-dynamic) attribute.
fn attribute_path(root: &str, type_: &AttributeType, pointer: &str) -> (String, bool) {
    let mut path = root.to_string();
    let mut current = Some(type_);

    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        current = match current {
            Some(AttributeType::Object(attrs)) => {
                match attrs
                    .iter()
                    .find(|(_, attr)| attr.wire_name.as_deref() == Some(segment.as_str()))
                {
                    Some((name, attr)) => {
                        path = join(&path, name);
                        Some(&attr.type_)
                    }
                    None => {
                        path = join(&path, &segment);
                        None
                    }
                }
            }
            Some(AttributeType::List(element)) => {
                path = format!("{}[{}]", path, segment);
                Some(element.as_ref())
            }
            Some(AttributeType::Map(element)) => {
                path = format!("{}[{:?}]", path, segment);
                Some(element.as_ref())
            }
            _ => {
                path = if segment.parse::<usize>().is_ok() {
                    format!("{}[{}]", path, segment)
                } else {
                    join(&path, &segment)
                };
                None
            }
        };
    }

    let typed = current.is_some_and(|t| !matches!(t, AttributeType::Dynamic));
    (path, typed)
}

/// Format a validation error into a user-friendly message
pub(crate) fn format_validation_error(error: &jsonschema::ValidationError) -> String {
    let msg = error.to_string();

    // Clean up common patterns for better readability
    msg.replace('"', "'")
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Validator;
    use serde_json::json;

    fn schema() -> Schema {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "name".to_string(),
            Attribute::required(AttributeType::String).wire("name"),
        );
        metadata.insert(
            "labels".to_string(),
            Attribute::optional(AttributeType::map(AttributeType::String)).wire("labels"),
        );

        let mut spec = BTreeMap::new();
        spec.insert(
            "replicas".to_string(),
            Attribute::optional(AttributeType::Int64)
                .wire("replicas")
                .with_validator(Validator::at_least(1)),
        );
        spec.insert(
            "tags".to_string(),
            Attribute::optional(AttributeType::list(AttributeType::String)).wire("tags"),
        );

        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), Attribute::computed(AttributeType::String));
        attributes.insert(
            "metadata".to_string(),
            Attribute::required(AttributeType::Object(metadata)).wire("metadata"),
        );
        attributes.insert(
            "spec".to_string(),
            Attribute::optional(AttributeType::Object(spec)).wire("spec"),
        );

        Schema {
            description: String::new(),
            markdown_description: String::new(),
            attributes,
        }
    }

    fn paths(diags: &Diagnostics) -> Vec<String> {
        diags.iter().filter_map(|d| d.path.clone()).collect()
    }

    #[test]
    fn test_valid_config() {
        let config = json!({
            "metadata": {"name": "demo", "labels": {"app": "demo"}},
            "spec": {"replicas": 2, "tags": ["a"]}
        });
        assert!(validate_block(&config, &schema()).is_empty());
    }

    #[test]
    fn test_missing_required() {
        let diags = validate_block(&json!({"metadata": {}}), &schema());
        assert!(diags.has_errors());
        assert_eq!(paths(&diags), vec!["metadata.name"]);

        let diags = validate_block(&json!({}), &schema());
        assert_eq!(paths(&diags), vec!["metadata"]);
    }

    #[test]
    fn test_unknown_attribute() {
        let config = json!({"metadata": {"name": "x", "uid": "123"}, "status": {}});
        let diags = validate_block(&config, &schema());
        let mut found = paths(&diags);
        found.sort();
        assert_eq!(found, vec!["metadata.uid", "status"]);
    }

    #[test]
    fn test_type_mismatch_and_validator() {
        let config = json!({
            "metadata": {"name": 5, "labels": {"app": 1}},
            "spec": {"replicas": 0, "tags": "a"}
        });
        let diags = validate_block(&config, &schema());
        let mut found = paths(&diags);
        found.sort();
        assert_eq!(
            found,
            vec![
                "metadata.labels[\"app\"]",
                "metadata.name",
                "spec.replicas",
                "spec.tags"
            ]
        );
        let replicas = diags
            .iter()
            .find(|d| d.path.as_deref() == Some("spec.replicas"))
            .unwrap();
        assert_eq!(replicas.summary, "Invalid Attribute Value");
    }

    #[test]
    fn test_float_is_not_an_integer() {
        let config = json!({"metadata": {"name": "x"}, "spec": {"replicas": 1.5}});
        let diags = validate_block(&config, &schema());
        assert_eq!(diags.errors().next().unwrap().summary, "Incorrect attribute value type");
    }

    #[test]
    fn test_read_only_attribute() {
        let config = json!({"id": "default/x", "metadata": {"name": "x"}});
        let diags = validate_block(&config, &schema());
        assert_eq!(paths(&diags), vec!["id"]);
    }

    #[test]
    fn test_attribute_path_follows_wire_names() {
        let spec = schema().attributes["spec"].type_.clone();

        assert_eq!(attribute_path("spec", &spec, ""), ("spec".to_string(), true));
        assert_eq!(
            attribute_path("spec", &spec, "/replicas"),
            ("spec.replicas".to_string(), true)
        );
        assert_eq!(
            attribute_path("spec", &spec, "/tags/1"),
            ("spec.tags[1]".to_string(), true)
        );
        assert_eq!(
            attribute_path("spec", &spec, "/extra/a~1b/0"),
            ("spec.extra.a/b[0]".to_string(), false)
        );

        let labels = schema().attributes["metadata"].type_.clone();
        assert_eq!(
            attribute_path("metadata", &labels, "/labels/app"),
            ("metadata.labels[\"app\"]".to_string(), true)
        );
    }

    #[test]
    fn test_spec_constraints() {
        let constraints = SpecConstraints::compile(&json!({
            "type": "object",
            "properties": {
                "replicas": {"type": "integer", "maximum": 5, "exclusiveMaximum": true}
            }
        }))
        .unwrap();
        let spec = &schema().attributes["spec"];

        let mut diags = Diagnostics::new();
        constraints.check(spec, &json!({"replicas": 5}), &mut diags);
        assert_eq!(paths(&diags), vec!["spec.replicas"]);

        let mut diags = Diagnostics::new();
        constraints.check(spec, &json!({"replicas": 4, "tags": null}), &mut diags);
        assert!(diags.is_empty());

        assert!(SpecConstraints::compile(&json!({"type": 12})).is_err());
    }

    #[test]
    fn test_non_object_block() {
        let diags = validate_block(&json!([1]), &schema());
        assert!(diags.has_errors());
    }
}
