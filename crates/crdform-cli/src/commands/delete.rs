//! Delete command - delete the object recorded in a state file

use console::style;
use std::path::Path;

use super::Settings;
use crate::display::check;
use crate::document::StateFile;
use crate::error::Result;

pub async fn run(settings: &Settings, state_path: &Path) -> Result<()> {
    let prior = StateFile::require(state_path)?;
    let provider = settings.connect().await?;

    let result = provider.delete(&prior.type_name, &prior.state).await;
    check("delete", &result.diagnostics)?;

    std::fs::remove_file(state_path)?;
    eprintln!(
        "{} {} deleted",
        style("✓").green().bold(),
        style(&prior.type_name).cyan()
    );
    Ok(())
}
