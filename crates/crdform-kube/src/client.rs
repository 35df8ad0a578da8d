//! Dynamic Kubernetes client
//!
//! Block operations only ever need three calls against a single object:
//! get, server-side apply and delete. [`DynamicClient`] is the seam between
//! the handlers and the cluster, implemented by [`KubeDynamicClient`] on top
//! of kube-rs and by [`crate::MockDynamicClient`] in memory.

use async_trait::async_trait;
use kube::{
    Client, Config,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy},
    config::{KubeConfigOptions, Kubeconfig},
    core::GroupVersionKind,
    discovery::ApiResource,
};
use serde_json::Value;

use crdform_core::{DeletionPropagation, ObjectId, ProviderConfig, ResourceType};

use crate::error::{KubeError, Result};

/// Reference to a single object of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn new(rt: &ResourceType, id: &ObjectId) -> Self {
        Self {
            group: rt.group.clone(),
            version: rt.version.clone(),
            kind: rt.kind.clone(),
            plural: rt.plural.clone(),
            namespace: id.namespace.clone(),
            name: id.name.clone(),
        }
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, &self.kind);
        ApiResource::from_gvk_with_plural(&gvk, &self.plural)
    }

    /// Error for an object that does not exist
    pub fn not_found(&self) -> KubeError {
        KubeError::NotFound {
            kind: self.kind.clone(),
            id: self.object_id().to_string(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.object_id())
    }
}

/// Parameters of a server-side apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyParams {
    pub field_manager: String,
    pub force: bool,
}

/// Single-object operations against the cluster
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait DynamicClient: Send + Sync {
    /// Fetch an object; a missing object is an error for which
    /// [`KubeError::is_not_found`] holds
    async fn get(&self, target: &ObjectRef) -> Result<Value>;

    /// Server-side apply an object, returning what the server stored
    async fn apply(&self, target: &ObjectRef, object: &Value, params: &ApplyParams)
    -> Result<Value>;

    /// Delete an object
    async fn delete(&self, target: &ObjectRef, propagation: DeletionPropagation) -> Result<()>;
}

/// [`DynamicClient`] backed by a kube-rs client
#[derive(Clone)]
pub struct KubeDynamicClient {
    client: Client,
}

impl KubeDynamicClient {
    /// Build a client from the provider configuration
    ///
    /// An explicit kubeconfig path or context selects that kubeconfig entry,
    /// otherwise the configuration is inferred (in-cluster or `KUBECONFIG`).
    pub async fn from_config(config: &ProviderConfig) -> Result<Self> {
        if config.kubeconfig.is_none() && config.context.is_none() {
            let client = Client::try_default().await?;
            return Ok(Self { client });
        }

        let kubeconfig = match &config.kubeconfig {
            Some(path) => Kubeconfig::read_from(path).map_err(|e| {
                KubeError::InvalidConfig(format!(
                    "failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => Kubeconfig::read()
                .map_err(|e| KubeError::InvalidConfig(format!("failed to read kubeconfig: {}", e)))?,
        };

        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };
        let kube_config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| KubeError::InvalidConfig(format!("failed to load kubeconfig: {}", e)))?;

        tracing::debug!(
            cluster_url = %kube_config.cluster_url,
            context = ?config.context,
            "connecting to cluster"
        );

        let client = Client::try_from(kube_config)?;
        Ok(Self { client })
    }

    fn api(&self, target: &ObjectRef) -> Api<DynamicObject> {
        let resource = target.api_resource();
        match &target.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl DynamicClient for KubeDynamicClient {
    async fn get(&self, target: &ObjectRef) -> Result<Value> {
        tracing::debug!(object = %target, "GET");
        let object = self.api(target).get(&target.name).await?;
        Ok(serde_json::to_value(object)?)
    }

    async fn apply(
        &self,
        target: &ObjectRef,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value> {
        tracing::debug!(
            object = %target,
            field_manager = %params.field_manager,
            force = params.force,
            "server-side apply"
        );

        let mut patch_params = PatchParams::apply(&params.field_manager);
        patch_params.force = params.force;

        let applied = self
            .api(target)
            .patch(&target.name, &patch_params, &Patch::Apply(object))
            .await?;
        Ok(serde_json::to_value(applied)?)
    }

    async fn delete(&self, target: &ObjectRef, propagation: DeletionPropagation) -> Result<()> {
        tracing::debug!(object = %target, %propagation, "DELETE");

        let params = DeleteParams {
            propagation_policy: Some(match propagation {
                DeletionPropagation::Orphan => PropagationPolicy::Orphan,
                DeletionPropagation::Background => PropagationPolicy::Background,
                DeletionPropagation::Foreground => PropagationPolicy::Foreground,
            }),
            ..Default::default()
        };

        self.api(target).delete(&target.name, &params).await?;
        Ok(())
    }
}
