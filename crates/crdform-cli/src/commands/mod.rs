//! CLI commands

use std::path::PathBuf;

use crdform_core::{Catalog, ProviderConfig};
use crdform_kube::{KubeDynamicClient, Provider};

use crate::error::Result;

// Offline commands
pub mod manifest;
pub mod schema;
pub mod types;
pub mod validate;

// Cluster commands
pub mod apply;
pub mod delete;
pub mod get;
pub mod import;
pub mod read;

/// Global options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub crds: Vec<PathBuf>,
}

impl Settings {
    /// Provider configuration with command-line overrides applied
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::load_from(path)?,
            None => ProviderConfig::load()?,
        };

        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        config.crd_paths.extend(self.crds.iter().cloned());

        Ok(config)
    }

    pub fn catalog(&self) -> Result<Catalog> {
        Ok(self.provider_config()?.catalog()?)
    }

    /// Connect to the cluster
    pub async fn connect(&self) -> Result<Provider<KubeDynamicClient>> {
        let config = self.provider_config()?;
        Ok(Provider::connect(&config).await?)
    }
}
