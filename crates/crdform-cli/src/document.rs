//! Block documents and state files
//!
//! A block document is a YAML mapping holding the block type name under
//! `type` and the block attributes next to it. A state file is the JSON
//! record `{ "type": ..., "state": ... }` written after cluster operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{CliError, Result};

/// A configuration block read from a file
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDocument {
    pub type_name: String,
    pub body: Value,
}

impl BlockDocument {
    /// Parse a block document from YAML
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| CliError::validation(format!("invalid YAML: {}", e)))?;

        let Value::Object(mut body) = value else {
            return Err(CliError::validation("block document must be a mapping"));
        };

        let type_name = match body.remove("type") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => {
                return Err(CliError::validation_with_help(
                    "block document has no `type`",
                    "add `type: <type name>`, see `crdform types`",
                ));
            }
        };

        Ok(Self {
            type_name,
            body: Value::Object(body),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }
}

/// State of one resource, as recorded on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(rename = "type")]
    pub type_name: String,
    pub state: Value,
}

impl StateFile {
    pub fn new(type_name: impl Into<String>, state: Value) -> Self {
        Self {
            type_name: type_name.into(),
            state,
        }
    }

    /// Load a state file, `None` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let state = serde_json::from_str(&content).map_err(|e| {
            CliError::validation(format!("invalid state file {}: {}", path.display(), e))
        })?;
        Ok(Some(state))
    }

    /// Load a state file that must exist
    pub fn require(path: &Path) -> Result<Self> {
        Self::load(path)?.ok_or_else(|| CliError::Io {
            message: format!("state file {} does not exist", path.display()),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CliError::Io {
            message: e.to_string(),
        })?;
        std::fs::write(path, json + "\n")?;
        tracing::debug!(path = %path.display(), "state written");
        Ok(())
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CliError::Io {
            message: e.to_string(),
        })
    }
}
