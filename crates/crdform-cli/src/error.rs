//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Block configuration or command input is invalid
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Provider configuration or CRD loading failed
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crdform::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Could not reach or talk to the cluster
    #[error("Cluster error: {message}")]
    #[diagnostic(code(crdform::cli::cluster))]
    Cluster { message: String },

    /// A block operation reported error diagnostics
    #[error("{operation} failed with {errors} error(s) and {warnings} warning(s)")]
    #[diagnostic(code(crdform::cli::operation))]
    OperationFailed {
        operation: String,
        errors: usize,
        warnings: usize,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::OperationFailed { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a cluster error
    pub fn cluster(message: impl Into<String>) -> Self {
        Self::Cluster {
            message: message.into(),
        }
    }

    /// Create an operation failure from diagnostic counts
    pub fn operation_failed(operation: impl Into<String>, errors: usize, warnings: usize) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            errors,
            warnings,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<crdform_core::CoreError> for CliError {
    fn from(err: crdform_core::CoreError) -> Self {
        use crdform_core::CoreError;
        match err {
            CoreError::UnknownResourceType { name } => Self::validation_with_help(
                format!("unknown resource type '{}'", name),
                "run `crdform types` to list the available types",
            ),
            CoreError::InvalidImportId { .. } => Self::validation(err.to_string()),
            CoreError::Io(e) => e.into(),
            other => Self::config(other.to_string()),
        }
    }
}

impl From<crdform_kube::KubeError> for CliError {
    fn from(err: crdform_kube::KubeError) -> Self {
        match err {
            crdform_kube::KubeError::Core(e) => e.into(),
            crdform_kube::KubeError::InvalidConfig(message) => Self::Config {
                message,
                help: Some("check --kubeconfig and --context".to_string()),
            },
            other => Self::cluster(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
