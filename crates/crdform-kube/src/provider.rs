//! Provider facade
//!
//! Dispatches block operations by type name to the handlers of the matching
//! resource type, the way a plugin host addresses resources and data sources.

use serde_json::Value;
use std::sync::Arc;

use crdform_core::{BlockKind, Catalog, Diagnostic, Diagnostics, ProviderConfig, ResourceType};

use crate::client::{DynamicClient, KubeDynamicClient};
use crate::data_source::{DataSourceHandler, read_manifest};
use crate::error::Result;
use crate::resource::{OperationResult, ResourceHandler};

/// Block operations for every type of a catalogue
pub struct Provider<C: DynamicClient> {
    catalog: Arc<Catalog>,
    client: C,
    field_manager: String,
}

impl Provider<KubeDynamicClient> {
    /// Connect to the cluster described by the configuration
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let catalog = config.catalog()?;
        let client = KubeDynamicClient::from_config(config).await?;
        tracing::debug!(types = catalog.len(), "provider configured");
        Ok(Self::new(Arc::new(catalog), client, &config.field_manager))
    }
}

impl<C: DynamicClient> Provider<C> {
    pub fn new(catalog: Arc<Catalog>, client: C, field_manager: impl Into<String>) -> Self {
        Self {
            catalog,
            client,
            field_manager: field_manager.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn resource_type(&self, type_name: &str) -> std::result::Result<&ResourceType, Diagnostic> {
        match self.catalog.resolve(type_name, false) {
            Ok((rt, BlockKind::Resource)) => Ok(rt),
            Ok((_, block)) => Err(Diagnostic::error(
                "Unknown Resource Type",
                format!("{} is a {} block, not a resource", type_name, block),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn handler<'a>(&'a self, rt: &'a ResourceType) -> ResourceHandler<'a> {
        ResourceHandler::new(rt, &self.client, &self.field_manager)
    }

    /// Validate a block configuration without calling the cluster
    pub fn validate(&self, type_name: &str, data_source: bool, config: &Value) -> Diagnostics {
        match self.catalog.resolve(type_name, data_source) {
            Ok((rt, block)) => rt.validate(block, config),
            Err(e) => Diagnostic::from(e).into(),
        }
    }

    pub async fn create(&self, type_name: &str, plan: &Value) -> OperationResult {
        match self.resource_type(type_name) {
            Ok(rt) => self.handler(rt).create(plan).await,
            Err(d) => OperationResult::failed(d),
        }
    }

    pub async fn read(&self, type_name: &str, prior: &Value) -> OperationResult {
        match self.resource_type(type_name) {
            Ok(rt) => self.handler(rt).read(prior).await,
            Err(d) => OperationResult::failed(d),
        }
    }

    pub async fn update(&self, type_name: &str, plan: &Value, prior: &Value) -> OperationResult {
        match self.resource_type(type_name) {
            Ok(rt) => self.handler(rt).update(plan, prior).await,
            Err(d) => OperationResult::failed(d),
        }
    }

    pub async fn delete(&self, type_name: &str, prior: &Value) -> OperationResult {
        match self.resource_type(type_name) {
            Ok(rt) => self.handler(rt).delete(prior).await,
            Err(d) => OperationResult::failed(d),
        }
    }

    pub async fn import_state(&self, type_name: &str, id: &str) -> OperationResult {
        match self.resource_type(type_name) {
            Ok(rt) => self.handler(rt).import_state(id).await,
            Err(d) => OperationResult::failed(d),
        }
    }

    /// Read a data source; `<type>_manifest` names render a manifest instead
    pub async fn read_data_source(&self, type_name: &str, config: &Value) -> OperationResult {
        match self.catalog.resolve(type_name, true) {
            Ok((rt, BlockKind::Manifest)) => read_manifest(rt, config),
            Ok((rt, _)) => DataSourceHandler::new(rt, &self.client).read(config).await,
            Err(e) => OperationResult::failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDynamicClient;
    use serde_json::json;

    fn provider() -> Provider<MockDynamicClient> {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        Provider::new(catalog, MockDynamicClient::new(), "crdform")
    }

    fn rule() -> Value {
        json!({
            "metadata": {"name": "errors", "namespace": "obs"},
            "spec": {
                "tenant_id": "tenant-a",
                "groups": [{
                    "name": "errors",
                    "interval": "1m",
                    "rules": [{"record": "job:errors:rate1m", "expr": "sum(rate({app=\"api\"} |= \"error\" [1m]))"}]
                }]
            }
        })
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let provider = provider();
        let type_name = "k8s_loki_grafana_com_recording_rule_v1";

        let created = provider.create(type_name, &rule()).await;
        assert!(!created.has_errors(), "{}", created.diagnostics);
        let state = created.state.unwrap();

        let data = provider
            .read_data_source(type_name, &json!({"metadata": {"name": "errors", "namespace": "obs"}}))
            .await;
        assert_eq!(data.state.unwrap()["spec"], state["spec"]);

        let mut plan = rule();
        plan["spec"]["groups"][0]["interval"] = json!("5m");
        let updated = provider.update(type_name, &plan, &state).await;
        assert_eq!(
            updated.state.unwrap()["spec"]["groups"][0]["interval"],
            "5m"
        );

        let deleted = provider.delete(type_name, &state).await;
        assert!(deleted.diagnostics.is_empty());
        assert_eq!(provider.client().object_count(), 0);

        let read = provider.read(type_name, &state).await;
        assert!(read.state.is_none());
    }

    #[tokio::test]
    async fn test_manifest_data_source() {
        let provider = provider();
        let result = provider
            .read_data_source("k8s_loki_grafana_com_recording_rule_v1_manifest", &rule())
            .await;
        assert!(!result.has_errors(), "{}", result.diagnostics);
        assert!(result.state.unwrap()["yaml"].as_str().unwrap().contains("tenantID: tenant-a"));
        assert_eq!(provider.client().operation_counts().total(), 0);
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = provider();

        let result = provider.create("k8s_example_com_widget_v1", &rule()).await;
        assert_eq!(result.diagnostics.errors().next().unwrap().summary, "Unknown Resource Type");

        let result = provider
            .create("k8s_loki_grafana_com_recording_rule_v1_manifest", &rule())
            .await;
        assert!(result.has_errors());
        assert_eq!(provider.client().operation_counts().total(), 0);
    }

    #[test]
    fn test_validate() {
        let provider = provider();
        let type_name = "k8s_loki_grafana_com_recording_rule_v1";
        assert!(!provider.validate(type_name, false, &rule()).has_errors());
        assert!(provider.validate(type_name, true, &rule()).has_errors());
        assert!(provider.validate("k8s_nothing_v1", false, &rule()).has_errors());
    }
}
