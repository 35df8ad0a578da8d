//! crdform Kube - block operations against a Kubernetes cluster
//!
//! This crate provides:
//! - **Dynamic client**: get, server-side apply and delete of any CRD kind
//! - **Resource handlers**: Create, Read, Update, Delete and ImportState
//! - **Data sources**: object lookups and offline manifest rendering
//! - **Wait conditions**: polling for JSONPath values or deletion
//! - **Mock client**: an in-memory API server for tests

pub mod client;
pub mod data_source;
pub mod error;
pub mod mock;
pub mod provider;
pub mod resource;
pub mod wait;

pub use client::{ApplyParams, DynamicClient, KubeDynamicClient, ObjectRef};
pub use data_source::{DataSourceHandler, read_manifest};
pub use error::{KubeError, Result};
pub use mock::{MockDynamicClient, OperationCounts};
pub use provider::Provider;
pub use resource::{OperationResult, ResourceHandler};
pub use wait::{WaitCondition, WaitConfig, wait_for};
