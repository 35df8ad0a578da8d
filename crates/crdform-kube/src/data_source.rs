//! Data source and manifest block operations

use serde_json::Value;

use crdform_core::{BlockKind, Diagnostics, Metadata, ResourceType, manifest, state};

use crate::client::{DynamicClient, ObjectRef};
use crate::resource::{OperationResult, api_diagnostic, not_found_diagnostic};

/// Read-only lookup of an existing object
pub struct DataSourceHandler<'a> {
    rt: &'a ResourceType,
    client: &'a dyn DynamicClient,
}

impl<'a> DataSourceHandler<'a> {
    pub fn new(rt: &'a ResourceType, client: &'a dyn DynamicClient) -> Self {
        Self { rt, client }
    }

    /// Read the object named by `metadata`; a missing object is an error
    pub async fn read(&self, config: &Value) -> OperationResult {
        let diagnostics = self.rt.validate(BlockKind::DataSource, config);
        if diagnostics.has_errors() {
            return OperationResult::without_state(diagnostics);
        }

        let metadata = match Metadata::from_block(config) {
            Ok(metadata) => metadata,
            Err(e) => return OperationResult::failed(e.into()),
        };
        let target = ObjectRef::new(self.rt, &metadata.object_id());

        match self.client.get(&target).await {
            Ok(object) => {
                OperationResult::with_state(state::data_source_state(self.rt, &object), diagnostics)
            }
            Err(e) if e.is_not_found() => {
                OperationResult::failed(not_found_diagnostic(&target, false))
            }
            Err(e) => OperationResult::failed(api_diagnostic("Unable to read object", &target, &e)),
        }
    }
}

/// Render a `_manifest` block into YAML without touching the cluster
pub fn read_manifest(rt: &ResourceType, config: &Value) -> OperationResult {
    let diagnostics = rt.validate(BlockKind::Manifest, config);
    if diagnostics.has_errors() {
        return OperationResult::without_state(diagnostics);
    }

    match manifest::manifest_state(rt, config) {
        Ok(state) => OperationResult::with_state(state, Diagnostics::new()),
        Err(e) => OperationResult::failed(e.into()),
    }
}
