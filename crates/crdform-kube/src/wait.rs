//! Wait-for-condition poller
//!
//! After an apply or delete is accepted by the API server, the object is
//! polled at a fixed interval until a condition holds or the timeout is
//! reached. Timing uses tokio's clock, so dropping the future cancels the
//! wait and tests can run on a paused clock.

use std::time::Duration;
use tokio::time::Instant;

use crdform_core::{DeleteWait, JsonPath, UpsertWait};

use crate::client::{DynamicClient, ObjectRef};
use crate::error::{KubeError, Result};

/// Condition to wait for
#[derive(Debug, Clone)]
pub enum WaitCondition {
    /// The object no longer exists
    Deleted,
    /// The JSONPath expression yields the expected value
    JsonPath { path: JsonPath, value: String },
}

impl WaitCondition {
    /// Build the condition of a `wait_for_upsert` entry
    pub fn upsert(wait: &UpsertWait) -> Result<Self> {
        Ok(Self::JsonPath {
            path: JsonPath::parse(&wait.jsonpath)?,
            value: wait.value.clone(),
        })
    }
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted => write!(f, "deletion"),
            Self::JsonPath { path, value } => write!(f, "{} == {:?}", path, value),
        }
    }
}

/// Timing of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&UpsertWait> for WaitConfig {
    fn from(wait: &UpsertWait) -> Self {
        Self {
            timeout: wait.timeout(),
            poll_interval: wait.poll_interval(),
        }
    }
}

impl From<&DeleteWait> for WaitConfig {
    fn from(wait: &DeleteWait) -> Self {
        Self {
            timeout: wait.timeout(),
            poll_interval: wait.poll_interval(),
        }
    }
}

/// Poll `target` until `condition` holds
///
/// Issues one Get per attempt. Returns as soon as an attempt observes the
/// condition, and fails with [`KubeError::Timeout`] once an attempt that did
/// not observe it finishes at or after the deadline: a zero timeout means
/// exactly one Get, and with interval `P > 0` at most `ceil(T/P) + 1` Gets
/// are issued. API errors are treated as "not yet" and the last one is
/// reported with the timeout.
pub async fn wait_for(
    client: &dyn DynamicClient,
    target: &ObjectRef,
    condition: &WaitCondition,
    config: WaitConfig,
) -> Result<()> {
    let start = Instant::now();
    let mut attempts = 0usize;
    let mut last_error: Option<String> = None;

    loop {
        attempts += 1;

        let satisfied = match client.get(target).await {
            Ok(object) => match condition {
                WaitCondition::Deleted => false,
                WaitCondition::JsonPath { path, value } => path.matches(&object, value),
            },
            Err(e) if e.is_not_found() => matches!(condition, WaitCondition::Deleted),
            Err(e) => {
                tracing::warn!(object = %target, error = %e, "poll failed, retrying");
                last_error = Some(e.to_string());
                false
            }
        };

        if satisfied {
            tracing::debug!(object = %target, %condition, attempts, "wait condition met");
            return Ok(());
        }

        if start.elapsed() >= config.timeout {
            return Err(KubeError::Timeout {
                condition: format!("{} {}", target, condition),
                timeout: config.timeout,
                last_error,
            });
        }

        tracing::debug!(object = %target, %condition, attempts, "wait condition not met yet");
        if config.poll_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(config.poll_interval).await;
        }
    }
}
