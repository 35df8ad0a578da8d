//! CRD schema representation
//!
//! Structured types for the parts of a CustomResourceDefinition that drive
//! block generation: names, scope, served versions and their OpenAPI v3
//! schemas.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// Full CRD name (e.g., "jobconfigs.execution.furiko.io")
    pub name: String,
    /// API group (e.g., "execution.furiko.io")
    pub group: String,
    /// Resource scope
    pub scope: CrdScope,
    /// Resource names (kind, plural, singular)
    pub names: CrdNames,
    /// API versions with their schemas
    pub versions: Vec<CrdVersionSchema>,
}

impl CrdSchema {
    /// Get all served versions
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersionSchema> {
        self.versions.iter().filter(|v| v.served)
    }

    /// Build the `apiVersion` string for a version of this CRD
    pub fn api_version(&self, version: &str) -> String {
        if self.group.is_empty() {
            version.to_string()
        } else {
            format!("{}/{}", self.group, version)
        }
    }
}

/// CRD scope - whether resources are namespaced or cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
}

impl CrdScope {
    pub fn is_namespaced(self) -> bool {
        self == Self::Namespaced
    }
}

impl std::fmt::Display for CrdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    /// Kind (e.g., "JobConfig")
    pub kind: String,
    /// Plural name (e.g., "jobconfigs")
    pub plural: String,
    /// Singular name (e.g., "jobconfig")
    pub singular: Option<String>,
    /// List kind (e.g., "JobConfigList")
    pub list_kind: Option<String>,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersionSchema {
    /// Version name (e.g., "v1", "v1beta1", "v1alpha1")
    pub name: String,
    /// Whether this version is served by the API server
    pub served: bool,
    /// Whether this is the storage version
    pub storage: bool,
    /// Whether this version is deprecated
    pub deprecated: bool,
    /// Deprecation warning message
    pub deprecation_warning: Option<String>,
    /// OpenAPI v3 schema, as far as block generation needs it
    pub schema: Option<OpenApiSchema>,
    /// The `spec` subtree of the OpenAPI schema exactly as written in the CRD
    pub raw_spec: Option<serde_json::Value>,
}

impl CrdVersionSchema {
    /// Get the root spec schema if present
    pub fn spec_schema(&self) -> Option<&SchemaProperty> {
        self.schema.as_ref().and_then(|s| s.properties.get("spec"))
    }

    /// Whether the root schema lists `spec` as required
    pub fn spec_required(&self) -> bool {
        self.schema.as_ref().is_some_and(|s| s.is_required("spec"))
    }

    /// Top-level description of the kind, if the schema has one
    pub fn description(&self) -> Option<&str> {
        self.schema.as_ref().and_then(|s| s.description.as_deref())
    }
}

/// OpenAPI v3 root schema of a CRD version
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenApiSchema {
    /// Description of the kind
    pub description: Option<String>,
    /// Root properties (typically: apiVersion, kind, metadata, spec, status)
    pub properties: BTreeMap<String, SchemaProperty>,
    /// Required field names at root level
    pub required: Vec<String>,
}

impl OpenApiSchema {
    /// Check if a property is required
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Schema for a single property
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    /// Property type
    pub type_: PropertyType,
    /// Human-readable description
    pub description: Option<String>,
    /// Default value
    pub default: Option<serde_json::Value>,
    /// Nested object properties
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    /// Required nested properties
    pub required: Option<Vec<String>>,
    /// Array item schema
    pub items: Option<Box<SchemaProperty>>,
    /// Additional properties for objects
    pub additional_properties: Option<AdditionalProperties>,
    /// Preserve unknown fields
    pub x_preserve_unknown: bool,
    /// Kubernetes embedded resource
    pub x_embedded_resource: bool,
    /// Integer or string (for ports, etc.)
    pub x_int_or_string: bool,
}

impl SchemaProperty {
    /// Check if this property has nested properties
    pub fn has_nested_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Check if a nested property is required
    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|r| r.iter().any(|n| n == name))
    }

    /// Whether the value shape is opaque and must be passed through untouched
    pub fn is_opaque(&self) -> bool {
        self.x_int_or_string
            || self.x_embedded_resource
            || (self.x_preserve_unknown && !self.has_nested_properties())
    }
}

/// Property type in OpenAPI schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// No `type` keyword present
    #[default]
    Unspecified,
    /// Unknown type name
    Unknown(String),
}

impl PropertyType {
    /// Parse from string representation
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Unspecified => write!(f, "unspecified"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Additional properties configuration for objects
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    /// Additional properties are allowed (any type)
    #[default]
    Allowed,
    /// Additional properties are not allowed
    Denied,
    /// Additional properties must match a schema
    Schema(Box<SchemaProperty>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_property_nested() {
        let mut nested = BTreeMap::new();
        nested.insert(
            "replicas".to_string(),
            SchemaProperty {
                type_: PropertyType::Integer,
                ..Default::default()
            },
        );

        let spec = SchemaProperty {
            type_: PropertyType::Object,
            properties: Some(nested),
            required: Some(vec!["replicas".to_string()]),
            ..Default::default()
        };

        assert!(spec.has_nested_properties());
        assert!(spec.is_required("replicas"));
        assert!(!spec.is_required("image"));
    }

    #[test]
    fn test_opaque_properties() {
        let int_or_string = SchemaProperty {
            x_int_or_string: true,
            ..Default::default()
        };
        assert!(int_or_string.is_opaque());

        let preserve = SchemaProperty {
            type_: PropertyType::Object,
            x_preserve_unknown: true,
            ..Default::default()
        };
        assert!(preserve.is_opaque());

        let mut props = BTreeMap::new();
        props.insert("name".to_string(), SchemaProperty::default());
        let preserve_with_props = SchemaProperty {
            type_: PropertyType::Object,
            properties: Some(props),
            x_preserve_unknown: true,
            ..Default::default()
        };
        assert!(!preserve_with_props.is_opaque());
    }

    #[test]
    fn test_crd_scope_display() {
        assert_eq!(CrdScope::Namespaced.to_string(), "Namespaced");
        assert_eq!(CrdScope::Cluster.to_string(), "Cluster");
        assert!(CrdScope::Namespaced.is_namespaced());
        assert!(!CrdScope::Cluster.is_namespaced());
    }

    #[test]
    fn test_crd_served_versions() {
        let schema = CrdSchema {
            name: "lokistacks.loki.grafana.com".to_string(),
            group: "loki.grafana.com".to_string(),
            scope: CrdScope::Namespaced,
            names: CrdNames {
                kind: "LokiStack".to_string(),
                plural: "lokistacks".to_string(),
                ..Default::default()
            },
            versions: vec![
                CrdVersionSchema {
                    name: "v1".to_string(),
                    served: true,
                    storage: true,
                    deprecated: false,
                    deprecation_warning: None,
                    schema: None,
                    raw_spec: None,
                },
                CrdVersionSchema {
                    name: "v1beta1".to_string(),
                    served: false,
                    storage: false,
                    deprecated: true,
                    deprecation_warning: Some("Use v1 instead".to_string()),
                    schema: None,
                    raw_spec: None,
                },
            ],
        };

        let served: Vec<_> = schema.served_versions().map(|v| v.name.as_str()).collect();
        assert_eq!(served, vec!["v1"]);
        assert_eq!(schema.api_version("v1"), "loki.grafana.com/v1");
    }
}
