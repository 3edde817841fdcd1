//! Usage command - one-shot fetch and print.

use anyhow::Result;
use clap::Args;
use tallybar_engine::UsageAggregator;

use crate::config::Config;
use crate::output::{TextFormatter, json};
use crate::{Cli, OutputFormat};

use super::select_providers;

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Skip providers that report an error.
    #[arg(long)]
    pub skip_errors: bool,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let providers = select_providers(cli, &config)?;

    let aggregator = UsageAggregator::new(providers, config.poll_interval())?;
    aggregator.refresh_now().await;
    let mut snapshot = aggregator.current_snapshot().await;

    if args.skip_errors {
        snapshot.results.retain(|r| r.error_state.is_none());
    }

    match cli.format {
        OutputFormat::Json => println!("{}", json::render(&snapshot, cli.pretty)?),
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_snapshot(&snapshot));
        }
    }

    Ok(())
}
