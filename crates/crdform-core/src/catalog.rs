//! Resource type catalogue
//!
//! The catalogue maps type names (`k8s_<group>_<kind>_<version>`) to the
//! Kubernetes identity of the kind and the three block schemas derived from
//! its CRD. It is seeded from the bundled CRDs and can be extended from
//! directories of CRD manifests at runtime.

use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use serde_json::Value;

use crate::crd::{CrdParser, CrdSchema, CrdScope, CrdVersionSchema};
use crate::diag::Diagnostics;
use crate::error::{CoreError, Result};
use crate::naming::{MANIFEST_SUFFIX, manifest_type_name, type_name};
use crate::schema::Schema;
use crate::translate;
use crate::validate::{SpecConstraints, validate_block};

/// CRDs compiled into the binary
const BUILTIN_CRDS: &[(&str, &str)] = &[
    (
        "furiko-jobconfigs.yaml",
        include_str!("../crds/furiko-jobconfigs.yaml"),
    ),
    ("furiko-jobs.yaml", include_str!("../crds/furiko-jobs.yaml")),
    (
        "loki-lokistacks.yaml",
        include_str!("../crds/loki-lokistacks.yaml"),
    ),
    (
        "loki-alertingrules.yaml",
        include_str!("../crds/loki-alertingrules.yaml"),
    ),
    (
        "loki-recordingrules.yaml",
        include_str!("../crds/loki-recordingrules.yaml"),
    ),
    (
        "loki-rulerconfigs.yaml",
        include_str!("../crds/loki-rulerconfigs.yaml"),
    ),
];

/// Which block of a resource type is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Resource,
    DataSource,
    Manifest,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::DataSource => write!(f, "data source"),
            Self::Manifest => write!(f, "manifest data source"),
        }
    }
}

/// One served version of a CRD kind
#[derive(Debug, Clone)]
pub struct ResourceType {
    pub type_name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub scope: CrdScope,
    pub deprecated: bool,
    resource_schema: Schema,
    data_source_schema: Schema,
    manifest_schema: Schema,
    spec_constraints: Option<SpecConstraints>,
}

impl ResourceType {
    /// Build the resource type for one version of a CRD
    pub fn from_crd(crd: &CrdSchema, version: &CrdVersionSchema) -> Self {
        let api_version = crd.api_version(&version.name);
        let kind = crd.names.kind.as_str();
        let namespaced = crd.scope.is_namespaced();
        let type_name = type_name(&crd.group, kind, &version.name);

        let spec_constraints = version.raw_spec.as_ref().and_then(|schema| {
            SpecConstraints::compile(schema)
                .inspect_err(|e| {
                    tracing::warn!(
                        type_name = %type_name,
                        error = %e,
                        "spec constraints are left to the API server"
                    )
                })
                .ok()
        });

        Self {
            type_name,
            group: crd.group.clone(),
            version: version.name.clone(),
            kind: kind.to_string(),
            plural: crd.names.plural.clone(),
            scope: crd.scope,
            deprecated: version.deprecated,
            resource_schema: translate::resource_schema(kind, &api_version, namespaced, version),
            data_source_schema: translate::data_source_schema(
                kind,
                &api_version,
                namespaced,
                version,
            ),
            manifest_schema: translate::manifest_schema(kind, &api_version, namespaced, version),
            spec_constraints,
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn namespaced(&self) -> bool {
        self.scope.is_namespaced()
    }

    pub fn manifest_type_name(&self) -> String {
        manifest_type_name(&self.type_name)
    }

    pub fn resource_schema(&self) -> &Schema {
        &self.resource_schema
    }

    pub fn data_source_schema(&self) -> &Schema {
        &self.data_source_schema
    }

    pub fn manifest_schema(&self) -> &Schema {
        &self.manifest_schema
    }

    pub fn schema(&self, block: BlockKind) -> &Schema {
        match block {
            BlockKind::Resource => &self.resource_schema,
            BlockKind::DataSource => &self.data_source_schema,
            BlockKind::Manifest => &self.manifest_schema,
        }
    }

    /// Validate a block configuration
    ///
    /// Checks the block against its schema, then the configured `spec`
    /// against the value constraints of the CRD. Data source blocks carry no
    /// `spec` of their own.
    pub fn validate(&self, block: BlockKind, config: &Value) -> Diagnostics {
        let schema = self.schema(block);
        let mut diagnostics = validate_block(config, schema);

        if block != BlockKind::DataSource
            && let Some(constraints) = &self.spec_constraints
            && let Some(spec_attr) = schema.attributes.get("spec")
            && let Some(spec) = config.get("spec")
        {
            constraints.check(spec_attr, spec, &mut diagnostics);
        }
        diagnostics
    }
}

/// All known resource types, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: BTreeMap<String, ResourceType>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue of the bundled CRDs
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for &(file, yaml) in BUILTIN_CRDS {
            let added = catalog.load_yaml(yaml)?;
            tracing::debug!(file, added, "loaded bundled CRD");
        }
        Ok(catalog)
    }

    /// Register every served version of a CRD, returning how many types were added
    ///
    /// A type name that is already registered is replaced by the new definition.
    pub fn add_crd(&mut self, crd: &CrdSchema) -> usize {
        let mut added = 0;
        for version in crd.served_versions() {
            let rt = ResourceType::from_crd(crd, version);
            if self.types.contains_key(&rt.type_name) {
                tracing::warn!(
                    type_name = %rt.type_name,
                    crd = %crd.name,
                    "resource type already registered, replacing it"
                );
            }
            self.types.insert(rt.type_name.clone(), rt);
            added += 1;
        }
        added
    }

    /// Register all CRDs of a (multi-document) YAML string
    pub fn load_yaml(&mut self, yaml: &str) -> Result<usize> {
        let crds = CrdParser::parse_all(yaml)?;
        Ok(crds.iter().map(|crd| self.add_crd(crd)).sum())
    }

    /// Register CRDs from a file, or from every YAML/JSON file below a directory
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            return self.load_yaml(&content);
        }

        if !path.is_dir() {
            return Err(CoreError::InvalidConfig {
                message: format!("CRD path does not exist: {}", path.display()),
            });
        }

        let mut added = 0;
        for entry in WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let file = entry.path();
            if !entry.file_type().is_file() || !is_manifest_file(file) {
                continue;
            }
            let content = std::fs::read_to_string(file)?;
            let count = self.load_yaml(&content).map_err(|e| CoreError::InvalidCrd {
                message: format!("{}: {}", file.display(), e),
            })?;
            tracing::debug!(file = %file.display(), count, "loaded CRD file");
            added += count;
        }
        Ok(added)
    }

    /// Look up a resource type by name
    pub fn get(&self, type_name: &str) -> Result<&ResourceType> {
        self.types
            .get(type_name)
            .ok_or_else(|| CoreError::UnknownResourceType {
                name: type_name.to_string(),
            })
    }

    /// Resolve a block type name to its resource type and block kind
    ///
    /// `<type>_manifest` addresses the manifest data source; any other name
    /// addresses the resource (or, with `data_source` set, the data source).
    pub fn resolve(&self, name: &str, data_source: bool) -> Result<(&ResourceType, BlockKind)> {
        if let Some(rt) = self.types.get(name) {
            let block = if data_source {
                BlockKind::DataSource
            } else {
                BlockKind::Resource
            };
            return Ok((rt, block));
        }

        match name.strip_suffix(MANIFEST_SUFFIX) {
            Some(base) => Ok((self.get(base)?, BlockKind::Manifest)),
            None => Err(CoreError::UnknownResourceType {
                name: name.to_string(),
            }),
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn is_manifest_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml") | Some("json")
    )
}
