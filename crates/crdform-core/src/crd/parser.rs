//! CRD YAML parser
//!
//! Parses CustomResourceDefinition YAML manifests into structured `CrdSchema`
//! values that the schema translator consumes.

use serde::Deserialize;
use serde_json::Value;

use super::schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, OpenApiSchema,
    PropertyType, SchemaProperty,
};
use crate::error::{CoreError, Result};

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single-document CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::invalid_crd(format!("invalid YAML: {}", e)))?;

        Self::parse_value(&value)
    }

    /// Parse every CRD in a (possibly multi-document) YAML stream
    ///
    /// Documents that are empty or are not CustomResourceDefinitions are skipped.
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = Value::deserialize(document).map_err(|e| {
                CoreError::invalid_crd(format!("document {}: invalid YAML: {}", index, e))
            })?;

            if value.is_null() || !is_crd(&value) {
                continue;
            }

            let crd = Self::parse_value(&value).map_err(|e| {
                CoreError::invalid_crd(format!("document {}: {}", index, e))
            })?;
            crds.push(crd);
        }

        Ok(crds)
    }

    /// Parse from a serde_json::Value (useful for objects read from the cluster)
    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(CoreError::invalid_crd(format!(
                "expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("missing 'metadata.name' field"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| CoreError::invalid_crd("missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("missing 'spec.group' field"))?
            .to_string();

        let scope = match spec.get("scope").and_then(Value::as_str) {
            Some("Cluster") => CrdScope::Cluster,
            _ => CrdScope::Namespaced,
        };

        let names = Self::parse_names(spec.get("names"))?;
        let versions = Self::parse_versions(spec.get("versions"))?;

        Ok(CrdSchema {
            name,
            group,
            scope,
            names,
            versions,
        })
    }

    fn parse_names(names_value: Option<&Value>) -> Result<CrdNames> {
        let names = names_value.ok_or_else(|| CoreError::invalid_crd("missing 'spec.names' field"))?;

        let kind = names
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("missing 'spec.names.kind' field"))?;

        let plural = names
            .get("plural")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("missing 'spec.names.plural' field"))?;

        Ok(CrdNames {
            kind: kind.to_string(),
            plural: plural.to_string(),
            singular: names
                .get("singular")
                .and_then(Value::as_str)
                .map(String::from),
            list_kind: names
                .get("listKind")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    fn parse_versions(versions_value: Option<&Value>) -> Result<Vec<CrdVersionSchema>> {
        let versions = versions_value
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::invalid_crd("missing 'spec.versions' array"))?;

        versions.iter().map(Self::parse_version).collect()
    }

    fn parse_version(version: &Value) -> Result<CrdVersionSchema> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("version missing 'name' field"))?
            .to_string();

        let served = version
            .get("served")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let storage = version
            .get("storage")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let deprecated = version
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let deprecation_warning = version
            .get("deprecationWarning")
            .and_then(Value::as_str)
            .map(String::from);

        let openapi = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"));
        let schema = openapi.map(Self::parse_openapi_schema);
        let raw_spec = openapi
            .and_then(|s| s.get("properties"))
            .and_then(|p| p.get("spec"))
            .cloned();

        Ok(CrdVersionSchema {
            name,
            served,
            storage,
            deprecated,
            deprecation_warning,
            schema,
            raw_spec,
        })
    }

    fn parse_openapi_schema(schema: &Value) -> OpenApiSchema {
        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::parse_schema_property(v)))
                    .collect()
            })
            .unwrap_or_default();

        OpenApiSchema {
            description: schema
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            properties,
            required: string_list(schema.get("required")).unwrap_or_default(),
        }
    }

    /// Parse a single schema property (recursive)
    fn parse_schema_property(prop: &Value) -> SchemaProperty {
        let type_ = prop
            .get("type")
            .and_then(Value::as_str)
            .map(PropertyType::parse)
            .unwrap_or_default();

        let properties = prop
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::parse_schema_property(v)))
                    .collect()
            });

        let items = prop
            .get("items")
            .map(|v| Box::new(Self::parse_schema_property(v)));

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            other => AdditionalProperties::Schema(Box::new(Self::parse_schema_property(other))),
        });

        SchemaProperty {
            type_,
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            default: prop.get("default").cloned(),
            properties,
            required: string_list(prop.get("required")),
            items,
            additional_properties,
            x_preserve_unknown: flag(prop, "x-kubernetes-preserve-unknown-fields"),
            x_embedded_resource: flag(prop, "x-kubernetes-embedded-resource"),
            x_int_or_string: flag(prop, "x-kubernetes-int-or-string"),
        }
    }
}

/// Check whether a YAML/JSON document is a CustomResourceDefinition
pub fn is_crd(value: &Value) -> bool {
    value.get("kind").and_then(Value::as_str) == Some("CustomResourceDefinition")
}

fn flag(prop: &Value, key: &str) -> bool {
    prop.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested<'a>(prop: &'a SchemaProperty, path: &str) -> &'a SchemaProperty {
        path.split('.').fold(prop, |current, part| {
            &current.properties.as_ref().unwrap()[part]
        })
    }

    const SAMPLE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: jobconfigs.execution.furiko.io
spec:
  group: execution.furiko.io
  scope: Namespaced
  names:
    kind: JobConfig
    plural: jobconfigs
    singular: jobconfig
    listKind: JobConfigList
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          description: JobConfig is the schema for a single job configuration.
          type: object
          required:
            - spec
          properties:
            spec:
              type: object
              required:
                - template
              properties:
                concurrency:
                  type: object
                  properties:
                    policy:
                      type: string
                      enum: [Allow, Forbid, Enqueue]
                    maxConcurrency:
                      type: integer
                      format: int64
                      minimum: 1
                template:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
                labels:
                  type: object
                  additionalProperties:
                    type: string
                port:
                  x-kubernetes-int-or-string: true
                ratio:
                  type: number
                  maximum: 1
                  exclusiveMaximum: true
            status:
              type: object
"#;

    #[test]
    fn test_parse_crd() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();

        assert_eq!(crd.name, "jobconfigs.execution.furiko.io");
        assert_eq!(crd.group, "execution.furiko.io");
        assert_eq!(crd.scope, CrdScope::Namespaced);
        assert_eq!(crd.names.kind, "JobConfig");
        assert_eq!(crd.names.plural, "jobconfigs");
        assert_eq!(crd.names.list_kind.as_deref(), Some("JobConfigList"));
        assert_eq!(crd.versions.len(), 1);

        let v1 = &crd.versions[0];
        assert!(v1.served);
        assert!(v1.storage);
        assert!(v1.spec_required());
        assert_eq!(
            v1.description(),
            Some("JobConfig is the schema for a single job configuration.")
        );
    }

    #[test]
    fn test_parse_nested_properties() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();
        let spec = crd.versions[0].spec_schema().unwrap();

        assert!(spec.is_required("template"));
        let policy = nested(spec, "concurrency.policy");
        assert_eq!(policy.type_, PropertyType::String);

        let max = nested(spec, "concurrency.maxConcurrency");
        assert_eq!(max.type_, PropertyType::Integer);

        let template = nested(spec, "template");
        assert!(template.x_preserve_unknown);
        assert!(template.is_opaque());

        let labels = nested(spec, "labels");
        assert!(matches!(
            labels.additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));

        let port = nested(spec, "port");
        assert_eq!(port.type_, PropertyType::Unspecified);
        assert!(port.x_int_or_string);
    }

    #[test]
    fn test_raw_spec_keeps_every_keyword() {
        let crd = CrdParser::parse(SAMPLE_CRD).unwrap();
        let raw = crd.versions[0].raw_spec.as_ref().unwrap();
        let concurrency = &raw["properties"]["concurrency"]["properties"];

        assert_eq!(concurrency["policy"]["enum"].as_array().unwrap().len(), 3);
        assert_eq!(concurrency["maxConcurrency"]["minimum"], 1);
        assert_eq!(concurrency["maxConcurrency"]["format"], "int64");
        assert_eq!(raw["properties"]["ratio"]["exclusiveMaximum"], true);
    }

    #[test]
    fn test_parse_cluster_scoped() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: rulerconfigs.example.com
spec:
  group: example.com
  scope: Cluster
  names:
    kind: RulerConfig
    plural: rulerconfigs
  versions:
    - name: v1
      served: true
      storage: true
"#;
        let crd = CrdParser::parse(yaml).unwrap();
        assert_eq!(crd.scope, CrdScope::Cluster);
        assert!(crd.versions[0].schema.is_none());
        assert!(crd.versions[0].raw_spec.is_none());
    }

    #[test]
    fn test_parse_all_skips_other_documents() {
        let yaml = format!(
            "{}\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm\n",
            SAMPLE_CRD
        );
        let crds = CrdParser::parse_all(&yaml).unwrap();
        assert_eq!(crds.len(), 1);
        assert_eq!(crds[0].names.kind, "JobConfig");
    }

    #[test]
    fn test_parse_not_a_crd() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: test\n";
        let result = CrdParser::parse(yaml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("expected CustomResourceDefinition")
        );
    }

    #[test]
    fn test_parse_missing_names() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: broken.example.com
spec:
  group: example.com
  versions: []
"#;
        let err = CrdParser::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("spec.names"));
    }
}
