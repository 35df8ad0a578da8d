//! Schema command - print the schema of a block type as JSON

use clap::ValueEnum;
use crdform_core::BlockKind;

use super::Settings;
use crate::error::{CliError, Result};

/// Block addressed by the schema command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlockArg {
    Resource,
    Data,
    Manifest,
}

impl From<BlockArg> for BlockKind {
    fn from(block: BlockArg) -> Self {
        match block {
            BlockArg::Resource => BlockKind::Resource,
            BlockArg::Data => BlockKind::DataSource,
            BlockArg::Manifest => BlockKind::Manifest,
        }
    }
}

pub fn run(settings: &Settings, type_name: &str, block: Option<BlockArg>) -> Result<()> {
    let catalog = settings.catalog()?;

    // A `_manifest` name selects the manifest block on its own
    let (rt, resolved) = catalog.resolve(type_name, block == Some(BlockArg::Data))?;
    let block = match (block, resolved) {
        (Some(block), BlockKind::Resource | BlockKind::DataSource) => block.into(),
        (_, resolved) => resolved,
    };

    let json = serde_json::to_string_pretty(rt.schema(block))
        .map_err(|e| CliError::validation(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
