//! Resource block operations
//!
//! Every operation reports failures as diagnostics. Configuration is
//! validated against the block schema before any API call is made.

use serde::Serialize;
use serde_json::Value;

use crdform_core::{
    BlockKind, Diagnostic, Diagnostics, Metadata, ObjectId, ResourceOptions, ResourceType,
    manifest, state,
};

use crate::client::{ApplyParams, DynamicClient, ObjectRef};
use crate::error::KubeError;
use crate::wait::{WaitCondition, WaitConfig, wait_for};

/// Outcome of a block operation
///
/// `state` is `None` when the object does not exist (after a delete, or when
/// a read found it gone).
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationResult {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl OperationResult {
    pub fn with_state(state: Value, diagnostics: Diagnostics) -> Self {
        Self {
            state: Some(state),
            diagnostics,
        }
    }

    pub fn without_state(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self::without_state(diagnostic.into())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Diagnostic for a failed API call
pub(crate) fn api_diagnostic(summary: &str, target: &ObjectRef, err: &KubeError) -> Diagnostic {
    Diagnostic::error(summary, format!("{}: {}", target, err))
}

/// Diagnostic for an object that does not exist
pub(crate) fn not_found_diagnostic(target: &ObjectRef, warning: bool) -> Diagnostic {
    if warning {
        Diagnostic::warning(
            "Resource not found",
            format!(
                "{} was not found in the cluster and has been removed from state.",
                target
            ),
        )
    } else {
        Diagnostic::error(
            "Resource not found",
            format!("{} was not found in the cluster.", target),
        )
    }
}

/// Operations of a `resource` block
pub struct ResourceHandler<'a> {
    rt: &'a ResourceType,
    client: &'a dyn DynamicClient,
    field_manager: &'a str,
}

impl<'a> ResourceHandler<'a> {
    /// Create a handler; `field_manager` applies when a block sets none
    pub fn new(rt: &'a ResourceType, client: &'a dyn DynamicClient, field_manager: &'a str) -> Self {
        Self {
            rt,
            client,
            field_manager,
        }
    }

    fn target(&self, id: &ObjectId) -> ObjectRef {
        ObjectRef::new(self.rt, id)
    }

    /// Create the object from a planned configuration
    pub async fn create(&self, plan: &Value) -> OperationResult {
        self.upsert(plan).await
    }

    /// Update the object to a new planned configuration
    ///
    /// The object identity (`metadata.name`, `metadata.namespace`) cannot
    /// change in place.
    pub async fn update(&self, plan: &Value, prior: &Value) -> OperationResult {
        if let (Ok(planned), Ok(current)) = (Metadata::from_block(plan), Metadata::from_block(prior))
            && planned.object_id() != current.object_id()
        {
            return OperationResult::failed(
                Diagnostic::error(
                    "Object identity cannot change",
                    format!(
                        "Changing the identity from '{}' to '{}' requires replacing the resource.",
                        current.object_id(),
                        planned.object_id()
                    ),
                )
                .at("metadata"),
            );
        }
        self.upsert(plan).await
    }

    async fn upsert(&self, plan: &Value) -> OperationResult {
        let diagnostics = self.rt.validate(BlockKind::Resource, plan);
        if diagnostics.has_errors() {
            return OperationResult::without_state(diagnostics);
        }

        let prepared = ResourceOptions::from_block(plan).and_then(|options| {
            let metadata = Metadata::from_block(plan)?;
            let object = manifest::build_object(self.rt, plan)?;
            Ok((options, metadata, object))
        });
        let (options, metadata, object) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return OperationResult::failed(e.into()),
        };

        let target = self.target(&metadata.object_id());
        let params = ApplyParams {
            field_manager: options.field_manager(self.field_manager).to_string(),
            force: options.force_conflicts(),
        };

        let applied = match self.client.apply(&target, &object, &params).await {
            Ok(applied) => applied,
            Err(e) => {
                return OperationResult::failed(api_diagnostic("Unable to apply object", &target, &e));
            }
        };

        let mut diagnostics = Diagnostics::new();
        for (index, wait) in options.upsert_waits().iter().enumerate() {
            let result = match WaitCondition::upsert(wait) {
                Ok(condition) => wait_for(self.client, &target, &condition, wait.into()).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                diagnostics.push(
                    Diagnostic::error("Wait for upsert failed", e.to_string())
                        .at(format!("wait_for_upsert[{}]", index)),
                );
                break;
            }
        }

        tracing::info!(object = %target, field_manager = %params.field_manager, "applied");
        OperationResult::with_state(state::resource_state(self.rt, &applied, plan), diagnostics)
    }

    /// Refresh state from the cluster
    pub async fn read(&self, prior: &Value) -> OperationResult {
        let metadata = match Metadata::from_block(prior) {
            Ok(metadata) => metadata,
            Err(e) => return OperationResult::failed(e.into()),
        };
        let target = self.target(&metadata.object_id());

        match self.client.get(&target).await {
            Ok(object) => OperationResult::with_state(
                state::resource_state(self.rt, &object, prior),
                Diagnostics::new(),
            ),
            Err(e) if e.is_not_found() => {
                tracing::info!(object = %target, "object gone, removing from state");
                OperationResult::without_state(not_found_diagnostic(&target, true).into())
            }
            Err(e) => OperationResult {
                state: Some(prior.clone()),
                diagnostics: api_diagnostic("Unable to read object", &target, &e).into(),
            },
        }
    }

    /// Delete the object, then wait for it to disappear when configured
    pub async fn delete(&self, prior: &Value) -> OperationResult {
        let prepared = ResourceOptions::from_block(prior)
            .and_then(|options| Ok((options, Metadata::from_block(prior)?)));
        let (options, metadata) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return OperationResult::failed(e.into()),
        };
        let target = self.target(&metadata.object_id());

        match self
            .client
            .delete(&target, options.deletion_propagation())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(object = %target, "already deleted");
            }
            Err(e) => {
                return OperationResult {
                    state: Some(prior.clone()),
                    diagnostics: api_diagnostic("Unable to delete object", &target, &e).into(),
                };
            }
        }

        if let Some(wait) = &options.wait_for_delete
            && let Err(e) = wait_for(self.client, &target, &WaitCondition::Deleted, wait.into()).await
        {
            return OperationResult {
                state: Some(prior.clone()),
                diagnostics: Diagnostic::error("Wait for deletion failed", e.to_string())
                    .at("wait_for_delete")
                    .into(),
            };
        }

        tracing::info!(object = %target, propagation = %options.deletion_propagation(), "deleted");
        OperationResult::without_state(Diagnostics::new())
    }

    /// Bring an existing object under management
    ///
    /// Expects `<namespace>/<name>` for namespaced kinds and `<name>` for
    /// cluster-scoped ones. A malformed id fails before any API call.
    pub async fn import_state(&self, id: &str) -> OperationResult {
        let object_id = match ObjectId::parse_import(id, self.rt.namespaced()) {
            Ok(object_id) => object_id,
            Err(e) => return OperationResult::failed(e.into()),
        };
        let target = self.target(&object_id);

        match self.client.get(&target).await {
            Ok(object) => {
                tracing::info!(object = %target, "imported");
                OperationResult::with_state(state::imported_state(self.rt, &object), Diagnostics::new())
            }
            Err(e) if e.is_not_found() => {
                OperationResult::failed(not_found_diagnostic(&target, false))
            }
            Err(e) => OperationResult::failed(api_diagnostic("Unable to read object", &target, &e)),
        }
    }
}
