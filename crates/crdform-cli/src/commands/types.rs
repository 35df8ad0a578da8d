//! Types command - list the resource types of the catalogue

use console::style;

use super::Settings;
use crate::display::pluralize;
use crate::error::Result;

pub fn run(settings: &Settings, filter: Option<&str>) -> Result<()> {
    let catalog = settings.catalog()?;

    let mut count = 0;
    for rt in catalog.types() {
        if filter.is_some_and(|f| !rt.type_name.contains(f)) {
            continue;
        }

        let scope = if rt.namespaced() { "Namespaced" } else { "Cluster" };
        let deprecated = if rt.deprecated {
            format!(" {}", style("(deprecated)").yellow())
        } else {
            String::new()
        };
        println!(
            "{}  {} {}{}",
            rt.type_name,
            style(rt.api_version()).dim(),
            style(format!("{} ({})", rt.kind, scope)).cyan(),
            deprecated
        );
        count += 1;
    }

    eprintln!("{}", style(pluralize(count, "type", "types")).dim());
    Ok(())
}
