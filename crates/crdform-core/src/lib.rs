//! crdform Core - CRD driven block schemas, validation and manifests
//!
//! This crate provides everything that does not need a cluster:
//! - `crd`: CustomResourceDefinition parsing
//! - `Catalog`: resource types keyed by block type name
//! - `Schema`: block schemas translated from CRD OpenAPI schemas
//! - `convert`: value mapping between blocks and Kubernetes objects
//! - `manifest`: object building and YAML rendering
//! - `JsonPath`: the expression language of `wait_for_upsert`

pub mod catalog;
pub mod config;
pub mod convert;
pub mod crd;
pub mod diag;
pub mod error;
pub mod jsonpath;
pub mod manifest;
pub mod model;
pub mod naming;
pub mod schema;
pub mod state;
pub mod translate;
pub mod validate;

pub use catalog::{BlockKind, Catalog, ResourceType};
pub use config::ProviderConfig;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{CoreError, Result};
pub use jsonpath::JsonPath;
pub use model::{
    DEFAULT_FIELD_MANAGER, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_WAIT_TIMEOUT_SECS, DeleteWait,
    DeletionPropagation, Metadata, ObjectId, ResourceOptions, UpsertWait,
};
pub use schema::{Attribute, AttributeType, Schema, Validator};
pub use validate::{SpecConstraints, validate_block};
