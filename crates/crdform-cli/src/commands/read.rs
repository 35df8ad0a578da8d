//! Read command - refresh a state file from the cluster

use console::style;
use std::path::Path;

use super::Settings;
use crate::display::check;
use crate::document::StateFile;
use crate::error::Result;

pub async fn run(settings: &Settings, state_path: &Path) -> Result<()> {
    let prior = StateFile::require(state_path)?;
    let provider = settings.connect().await?;

    let result = provider.read(&prior.type_name, &prior.state).await;
    check("read", &result.diagnostics)?;

    match result.state {
        Some(state) => {
            StateFile::new(prior.type_name, state).save(state_path)?;
            eprintln!("{} state refreshed", style("✓").green().bold());
        }
        None => {
            std::fs::remove_file(state_path)?;
            eprintln!(
                "{} object is gone, removed {}",
                style("⚠").yellow(),
                state_path.display()
            );
        }
    }
    Ok(())
}
