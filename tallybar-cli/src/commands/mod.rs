//! CLI command implementations.

pub mod providers;
pub mod usage;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tallybar_core::{ProviderKind, UsageProvider};
use tallybar_providers::registry;

use crate::Cli;
use crate::config::Config;

/// Resolves the provider list from the `--provider` flag and the config's
/// enabled map.
pub fn select_providers(cli: &Cli, config: &Config) -> Result<Vec<Arc<dyn UsageProvider>>> {
    let kinds: Vec<ProviderKind> = match cli.provider.as_deref() {
        None => ProviderKind::all()
            .iter()
            .copied()
            .filter(|kind| config.is_provider_enabled(*kind))
            .collect(),
        Some("all") => ProviderKind::all().to_vec(),
        Some(names) => names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ProviderKind::from_cli_name)
            .collect::<Result<Vec<_>, _>>()?,
    };

    if kinds.is_empty() {
        anyhow::bail!("No providers selected");
    }

    Ok(kinds.into_iter().map(registry::client_for).collect())
}

// ============================================================================
// Tests
// ============================================================================
