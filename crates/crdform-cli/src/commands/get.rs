//! Get command - read an object through its data source

use serde_json::{Map, Value};

use super::Settings;
use crate::display::check;
use crate::error::{CliError, Result};

pub async fn run(
    settings: &Settings,
    type_name: &str,
    name: &str,
    namespace: Option<&str>,
) -> Result<()> {
    let catalog = settings.catalog()?;
    let rt = catalog.get(type_name)?;

    let mut metadata = Map::new();
    metadata.insert("name".to_string(), Value::String(name.to_string()));
    if rt.namespaced() {
        let namespace = namespace.unwrap_or("default");
        metadata.insert("namespace".to_string(), Value::String(namespace.to_string()));
    } else if namespace.is_some() {
        return Err(CliError::validation(format!(
            "{} is cluster-scoped, --namespace does not apply",
            rt.kind
        )));
    }
    let mut config = Map::new();
    config.insert("metadata".to_string(), Value::Object(metadata));

    let provider = settings.connect().await?;
    let result = provider
        .read_data_source(type_name, &Value::Object(config))
        .await;
    check("get", &result.diagnostics)?;

    if let Some(state) = result.state {
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| CliError::validation(e.to_string()))?;
        println!("{}", json);
    }
    Ok(())
}
