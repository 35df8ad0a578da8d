//! Validate command - check a block document against its schema

use console::style;
use std::path::Path;

use super::Settings;
use crate::display::{pluralize, print_diagnostics};
use crate::document::BlockDocument;
use crate::error::{CliError, Result};

pub fn run(settings: &Settings, file: &Path, data_source: bool) -> Result<()> {
    let document = BlockDocument::load(file)?;
    let catalog = settings.catalog()?;
    let (rt, block) = catalog.resolve(&document.type_name, data_source)?;

    eprintln!(
        "{} Validating {} {} from {}",
        style("→").blue(),
        block,
        style(&document.type_name).cyan(),
        file.display()
    );

    let diagnostics = rt.validate(block, &document.body);
    print_diagnostics(&diagnostics);

    let errors = diagnostics.errors().count();
    if errors > 0 {
        return Err(CliError::validation(format!(
            "{} in {}",
            pluralize(errors, "error", "errors"),
            file.display()
        )));
    }

    println!("{} Configuration is valid", style("✓").green().bold());
    Ok(())
}
