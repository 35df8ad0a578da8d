//! Error types for crdform-kube

use std::time::Duration;
use thiserror::Error;

/// Result type for crdform-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object does not exist
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    /// A wait condition did not hold before its timeout
    #[error("timed out after {}s waiting for {condition}{}", .timeout.as_secs(), last_error_suffix(.last_error))]
    Timeout {
        condition: String,
        timeout: Duration,
        last_error: Option<String>,
    },

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] crdform_core::CoreError),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {})", e),
        None => String::new(),
    }
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::NotFound { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> KubeError {
        KubeError::Api(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Test".to_string(),
            code,
        }))
    }

    #[test]
    fn test_is_not_found() {
        assert!(api_error(404).is_not_found());
        assert!(!api_error(500).is_not_found());
        assert!(
            KubeError::NotFound {
                kind: "LokiStack".to_string(),
                id: "logging/lokistack".to_string(),
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = KubeError::Timeout {
            condition: ".status.phase == Ready".to_string(),
            timeout: Duration::from_secs(30),
            last_error: Some("connection refused".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 30s waiting for .status.phase == Ready (last error: connection refused)"
        );

        let err = KubeError::Timeout {
            condition: "deletion".to_string(),
            timeout: Duration::from_secs(0),
            last_error: None,
        };
        assert_eq!(err.to_string(), "timed out after 0s waiting for deletion");
    }
}
