//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid CRD: {message}")]
    InvalidCrd { message: String },

    #[error("Unknown resource type: {name}")]
    UnknownResourceType { name: String },

    #[error("Unexpected import identifier '{id}': expected {expected}")]
    InvalidImportId { id: String, expected: String },

    #[error("Invalid JSONPath expression '{expression}': {message}")]
    InvalidJsonPath { expression: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn invalid_crd(message: impl Into<String>) -> Self {
        Self::InvalidCrd {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
