//! Mock dynamic client for testing
//!
//! Stores objects in memory and behaves like a small API server: apply
//! stamps server-side metadata and keeps the existing status, delete removes
//! the object (optionally only after a number of further reads, to emulate
//! finalizers), and errors can be injected into reads.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crdform_core::DeletionPropagation;

use crate::client::{ApplyParams, DynamicClient, ObjectRef};
use crate::error::{KubeError, Result};

/// In-memory dynamic client for testing
#[derive(Clone, Default)]
pub struct MockDynamicClient {
    state: Arc<RwLock<MockState>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub applies: usize,
    pub deletes: usize,
}

impl OperationCounts {
    pub fn total(&self) -> usize {
        self.gets + self.applies + self.deletes
    }
}

#[derive(Default)]
struct MockState {
    objects: BTreeMap<ObjectRef, Value>,
    /// Objects being deleted, with the number of reads left until they disappear
    terminating: BTreeMap<ObjectRef, usize>,
    /// Status to set after the given number of reads
    pending_status: BTreeMap<ObjectRef, (usize, Value)>,
    get_errors: VecDeque<String>,
    last_apply: Option<(ObjectRef, ApplyParams)>,
    last_propagation: Option<DeletionPropagation>,
    resource_version: u64,
}

impl MockDynamicClient {
    /// Create a new empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self, f: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self
            .operations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut ops);
    }

    /// Store an object directly, bypassing apply
    pub fn insert(&self, target: &ObjectRef, object: Value) {
        self.state().objects.insert(target.clone(), object);
    }

    /// Current stored object, without counting a read
    pub fn object(&self, target: &ObjectRef) -> Option<Value> {
        self.read_state().objects.get(target).cloned()
    }

    /// Set `.status` of a stored object
    pub fn set_status(&self, target: &ObjectRef, status: Value) {
        if let Some(Value::Object(object)) = self.state().objects.get_mut(target) {
            object.insert("status".to_string(), status);
        }
    }

    /// Set `.status` once `reads` more reads of the object have been served
    pub fn set_status_after(&self, target: &ObjectRef, reads: usize, status: Value) {
        if reads == 0 {
            self.set_status(target, status);
        } else {
            self.state()
                .pending_status
                .insert(target.clone(), (reads, status));
        }
    }

    /// Keep deleted objects readable for `reads` reads after the delete call
    pub fn delete_after_reads(&self, target: &ObjectRef, reads: usize) {
        self.state().terminating.insert(target.clone(), reads);
    }

    /// Fail the next read with the given message (HTTP 500)
    pub fn fail_next_get(&self, message: impl Into<String>) {
        self.state().get_errors.push_back(message.into());
    }

    /// Parameters of the most recent apply
    pub fn last_apply(&self) -> Option<(ObjectRef, ApplyParams)> {
        self.read_state().last_apply.clone()
    }

    /// Propagation policy of the most recent delete
    pub fn last_propagation(&self) -> Option<DeletionPropagation> {
        self.read_state().last_propagation
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        self.count(|ops| *ops = OperationCounts::default());
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.read_state().objects.len()
    }
}

fn internal_error(message: String) -> KubeError {
    KubeError::Api(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

#[async_trait]
impl DynamicClient for MockDynamicClient {
    async fn get(&self, target: &ObjectRef) -> Result<Value> {
        self.count(|ops| ops.gets += 1);

        let mut state = self.state();
        if let Some(message) = state.get_errors.pop_front() {
            return Err(internal_error(message));
        }

        let object = state
            .objects
            .get(target)
            .cloned()
            .ok_or_else(|| target.not_found())?;

        if let Some((reads, status)) = state.pending_status.remove(target) {
            if reads <= 1 {
                if let Some(Value::Object(stored)) = state.objects.get_mut(target) {
                    stored.insert("status".to_string(), status);
                }
            } else {
                state
                    .pending_status
                    .insert(target.clone(), (reads - 1, status));
            }
        }

        if let Some(reads) = state.terminating.get(target).copied()
            && state.objects.get(target).is_some_and(is_terminating)
        {
            if reads <= 1 {
                state.terminating.remove(target);
                state.objects.remove(target);
            } else {
                state.terminating.insert(target.clone(), reads - 1);
            }
        }

        Ok(object)
    }

    async fn apply(
        &self,
        target: &ObjectRef,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value> {
        self.count(|ops| ops.applies += 1);

        let mut state = self.state();
        state.resource_version += 1;
        let resource_version = state.resource_version.to_string();

        let mut stored = match object {
            Value::Object(map) => map.clone(),
            _ => {
                return Err(KubeError::Serialization(
                    "applied object must be a JSON object".to_string(),
                ));
            }
        };

        let previous = state.objects.get(target);
        let uid = previous
            .and_then(|p| p.pointer("/metadata/uid"))
            .cloned()
            .unwrap_or_else(|| json!(format!("uid-{}", resource_version)));
        if let Some(status) = previous.and_then(|p| p.get("status")).cloned() {
            stored.insert("status".to_string(), status);
        }

        let metadata = stored
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(metadata) = metadata {
            metadata.insert("uid".to_string(), uid);
            metadata.insert("resourceVersion".to_string(), json!(resource_version));
            metadata.insert("generation".to_string(), json!(1));
        }

        let stored = Value::Object(stored);
        state.objects.insert(target.clone(), stored.clone());
        state.last_apply = Some((target.clone(), params.clone()));
        Ok(stored)
    }

    async fn delete(&self, target: &ObjectRef, propagation: DeletionPropagation) -> Result<()> {
        self.count(|ops| ops.deletes += 1);

        let mut state = self.state();
        state.last_propagation = Some(propagation);

        if !state.objects.contains_key(target) {
            return Err(target.not_found());
        }

        if state.terminating.get(target).is_some_and(|reads| *reads > 0) {
            if let Some(Value::Object(object)) = state.objects.get_mut(target)
                && let Some(Value::Object(metadata)) = object.get_mut("metadata")
            {
                metadata.insert(
                    "deletionTimestamp".to_string(),
                    json!("2024-01-01T00:00:00Z"),
                );
            }
        } else {
            state.terminating.remove(target);
            state.objects.remove(target);
        }
        Ok(())
    }
}

fn is_terminating(object: &Value) -> bool {
    object.pointer("/metadata/deletionTimestamp").is_some()
}
