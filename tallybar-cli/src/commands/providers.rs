//! Providers command - list known providers.

use anyhow::Result;
use tallybar_core::ProviderKind;

use crate::config::Config;
use crate::{Cli, OutputFormat};

/// Runs the providers command.
pub fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    if cli.format == OutputFormat::Json {
        let rows: Vec<serde_json::Value> = ProviderKind::all()
            .iter()
            .map(|kind| {
                serde_json::json!({
                    "name": kind.cli_name(),
                    "display_name": kind.display_name(),
                    "enabled": config.is_provider_enabled(*kind),
                })
            })
            .collect();
        let body = if cli.pretty {
            serde_json::to_string_pretty(&rows)?
        } else {
            serde_json::to_string(&rows)?
        };
        println!("{body}");
        return Ok(());
    }

    for kind in ProviderKind::all() {
        let marker = if config.is_provider_enabled(*kind) {
            "enabled"
        } else {
            "disabled"
        };
        println!("{:<12} {:<10} {marker}", kind.display_name(), kind.cli_name());
    }

    Ok(())
}
