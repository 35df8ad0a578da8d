//! Typed views of the attributes every block shares
//!
//! The `spec` subtree is mapped generically from the CRD schema, but the
//! envelope (`metadata`, the resource options and the `id`) has a fixed
//! shape across all resource types and is modelled here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Field manager used for server-side apply when none is configured
pub const DEFAULT_FIELD_MANAGER: &str = "crdform";

/// Default timeout of wait blocks, in seconds
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 30;

/// Default poll interval of wait blocks, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Object metadata as configured in a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Metadata {
    /// Read the `metadata` attribute of a block value
    pub fn from_block(block: &Value) -> Result<Self> {
        let metadata = block
            .get("metadata")
            .filter(|m| !m.is_null())
            .ok_or_else(|| CoreError::MissingField {
                field: "metadata".to_string(),
            })?;
        Ok(serde_json::from_value(metadata.clone())?)
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

/// Propagation policy used when deleting an object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPropagation {
    Orphan,
    #[default]
    Background,
    Foreground,
}

impl DeletionPropagation {
    pub const VALUES: [&'static str; 3] = ["Orphan", "Background", "Foreground"];
}

impl std::fmt::Display for DeletionPropagation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Orphan => write!(f, "Orphan"),
            Self::Background => write!(f, "Background"),
            Self::Foreground => write!(f, "Foreground"),
        }
    }
}

/// One `wait_for_upsert` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertWait {
    pub jsonpath: String,
    pub value: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub poll_interval: Option<u64>,
}

impl UpsertWait {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }
}

/// The `wait_for_delete` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteWait {
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub poll_interval: Option<u64>,
}

impl DeleteWait {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS))
    }
}

/// Resource-level options shared by every resource block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOptions {
    #[serde(default)]
    pub force_conflicts: Option<bool>,
    #[serde(default)]
    pub field_manager: Option<String>,
    #[serde(default)]
    pub deletion_propagation: Option<DeletionPropagation>,
    #[serde(default)]
    pub wait_for_upsert: Option<Vec<UpsertWait>>,
    #[serde(default)]
    pub wait_for_delete: Option<DeleteWait>,
}

impl ResourceOptions {
    /// Attribute names of the options, in schema order
    pub const ATTRIBUTES: [&'static str; 5] = [
        "deletion_propagation",
        "field_manager",
        "force_conflicts",
        "wait_for_delete",
        "wait_for_upsert",
    ];

    /// Read the options from a block value, ignoring every other attribute
    pub fn from_block(block: &Value) -> Result<Self> {
        let mut options = serde_json::Map::new();
        for name in Self::ATTRIBUTES {
            if let Some(v) = block.get(name).filter(|v| !v.is_null()) {
                options.insert(name.to_string(), v.clone());
            }
        }
        Ok(serde_json::from_value(Value::Object(options))?)
    }

    pub fn force_conflicts(&self) -> bool {
        self.force_conflicts.unwrap_or(false)
    }

    pub fn field_manager<'a>(&'a self, default: &'a str) -> &'a str {
        self.field_manager.as_deref().unwrap_or(default)
    }

    pub fn deletion_propagation(&self) -> DeletionPropagation {
        self.deletion_propagation.unwrap_or_default()
    }

    pub fn upsert_waits(&self) -> &[UpsertWait] {
        self.wait_for_upsert.as_deref().unwrap_or_default()
    }
}

/// Identity of an object within its resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectId {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Parse a `terraform import` identifier
    ///
    /// Namespaced kinds expect `<namespace>/<name>`, cluster-scoped kinds
    /// expect a bare `<name>`.
    pub fn parse_import(id: &str, namespaced: bool) -> Result<Self> {
        if namespaced {
            match id.split_once('/') {
                Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                    Ok(Self::namespaced(ns, name))
                }
                _ => Err(CoreError::InvalidImportId {
                    id: id.to_string(),
                    expected: "<namespace>/<name>".to_string(),
                }),
            }
        } else if id.is_empty() || id.contains('/') {
            Err(CoreError::InvalidImportId {
                id: id.to_string(),
                expected: "<name>".to_string(),
            })
        } else {
            Ok(Self::cluster(id))
        }
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
