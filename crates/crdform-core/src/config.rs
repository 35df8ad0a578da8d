//! Provider configuration
//!
//! Stored in `~/.config/crdform/config.yaml` by default:
//!
//! ```yaml
//! kubeconfig: ~/.kube/config
//! context: staging
//! fieldManager: platform-team
//! crdPaths:
//!   - ./crds
//! ```
//!
//! `~` expands to the home directory, other relative paths are relative to
//! the configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::error::{CoreError, Result};
use crate::model::DEFAULT_FIELD_MANAGER;

/// Provider configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Path to a kubeconfig file, inferred from the environment when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Field manager for server-side apply when a resource sets none
    #[serde(default = "default_field_manager")]
    pub field_manager: String,

    /// Extra CRD files or directories to load resource types from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crd_paths: Vec<PathBuf>,

    /// Whether to include the bundled CRDs
    #[serde(default = "default_true")]
    pub builtin_crds: bool,
}

fn default_field_manager() -> String {
    DEFAULT_FIELD_MANAGER.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            field_manager: default_field_manager(),
            crd_paths: Vec::new(),
            builtin_crds: true,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;
        if config.field_manager.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: format!("{}: fieldManager must not be empty", path.display()),
            });
        }

        let base = path.parent();
        config.kubeconfig = config.kubeconfig.map(|p| resolve_path(&p, base));
        for crd_path in &mut config.crd_paths {
            *crd_path = resolve_path(crd_path, base);
        }

        tracing::debug!(path = %path.display(), "loaded provider configuration");
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| CoreError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("crdform").join("config.yaml"))
    }

    /// Build the resource type catalogue this configuration describes
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = if self.builtin_crds {
            Catalog::builtin()?
        } else {
            Catalog::new()
        };

        for path in &self.crd_paths {
            let added = catalog.load_path(path)?;
            tracing::info!(path = %path.display(), added, "loaded CRDs");
        }

        Ok(catalog)
    }
}

fn resolve_path(path: &Path, base: Option<&Path>) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}
