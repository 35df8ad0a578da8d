//! Manifest command - render a block document as Kubernetes YAML

use std::path::Path;

use crdform_core::ResourceOptions;
use crdform_kube::read_manifest;

use super::Settings;
use crate::display::check;
use crate::document::BlockDocument;
use crate::error::Result;

pub fn run(settings: &Settings, file: &Path) -> Result<()> {
    let mut document = BlockDocument::load(file)?;
    let catalog = settings.catalog()?;

    // Resource documents render too, their cluster options are ignored
    let (rt, _) = catalog.resolve(&document.type_name, false)?;
    if let Some(body) = document.body.as_object_mut() {
        for option in ResourceOptions::ATTRIBUTES {
            body.remove(option);
        }
    }

    let result = read_manifest(rt, &document.body);
    check("manifest", &result.diagnostics)?;

    if let Some(yaml) = result
        .state
        .as_ref()
        .and_then(|state| state.get("yaml"))
        .and_then(|yaml| yaml.as_str())
    {
        print!("{}", yaml);
    }
    Ok(())
}
