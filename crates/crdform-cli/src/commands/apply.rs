//! Apply command - create or update a resource from a block document

use console::style;
use std::path::Path;

use crdform_kube::OperationResult;

use super::Settings;
use crate::display::check;
use crate::document::{BlockDocument, StateFile};
use crate::error::{CliError, Result};

pub async fn run(settings: &Settings, file: &Path, state_path: Option<&Path>) -> Result<()> {
    let document = BlockDocument::load(file)?;

    let prior = match state_path {
        Some(path) => StateFile::load(path)?,
        None => None,
    };
    if let Some(prior) = &prior
        && prior.type_name != document.type_name
    {
        return Err(CliError::validation_with_help(
            format!(
                "state holds a {} but the document is a {}",
                prior.type_name, document.type_name
            ),
            "use a separate state file per resource",
        ));
    }

    let provider = settings.connect().await?;
    let (operation, result) = match &prior {
        Some(prior) => (
            "update",
            provider
                .update(&document.type_name, &document.body, &prior.state)
                .await,
        ),
        None => (
            "create",
            provider.create(&document.type_name, &document.body).await,
        ),
    };

    write_state(&document.type_name, &result, state_path)?;
    check(operation, &result.diagnostics)?;

    eprintln!(
        "{} {} {}",
        style("✓").green().bold(),
        style(&document.type_name).cyan(),
        if operation == "create" { "created" } else { "updated" }
    );
    Ok(())
}

/// Record the state of an operation: into the state file when given, else on stdout
pub fn write_state(
    type_name: &str,
    result: &OperationResult,
    state_path: Option<&Path>,
) -> Result<()> {
    let Some(state) = &result.state else {
        return Ok(());
    };

    let record = StateFile::new(type_name, state.clone());
    match state_path {
        Some(path) => record.save(path),
        None => {
            println!("{}", record.to_pretty_json()?);
            Ok(())
        }
    }
}
