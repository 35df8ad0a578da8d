//! Import command - bring an existing object under management

use console::style;
use std::path::Path;

use crdform_core::ObjectId;

use super::Settings;
use super::apply::write_state;
use crate::display::check;
use crate::error::Result;

pub async fn run(
    settings: &Settings,
    type_name: &str,
    id: &str,
    state_path: Option<&Path>,
) -> Result<()> {
    // Reject malformed identifiers before connecting
    let catalog = settings.catalog()?;
    let rt = catalog.get(type_name)?;
    ObjectId::parse_import(id, rt.namespaced())?;

    let provider = settings.connect().await?;
    let result = provider.import_state(type_name, id).await;

    write_state(type_name, &result, state_path)?;
    check("import", &result.diagnostics)?;

    eprintln!(
        "{} imported {} {}",
        style("✓").green().bold(),
        style(type_name).cyan(),
        id
    );
    Ok(())
}
