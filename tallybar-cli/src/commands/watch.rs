//! Watch command - live usage monitoring.

use std::io::{Write, stdout};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tallybar_engine::UsageAggregator;
use tracing::info;

use crate::Cli;
use crate::config::Config;
use crate::output::TextFormatter;

use super::select_providers;

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds.
    #[arg(long, short, default_value = "60")]
    pub interval: u64,

    /// Minimum interval to use.
    #[arg(long, default_value = "10")]
    pub min_interval: u64,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let refresh_interval = args.interval.max(args.min_interval);
    info!(interval = refresh_interval, "Starting watch mode");

    let config = Config::load()?;
    let providers = select_providers(cli, &config)?;

    let aggregator =
        UsageAggregator::new(providers, Duration::from_secs(refresh_interval))?;
    let mut subscription = aggregator.subscribe().await;
    aggregator.start();

    let formatter = TextFormatter::new(!cli.no_color);

    while let Some(snapshot) = subscription.next().await {
        // Clear screen
        print!("\x1b[2J\x1b[H");
        stdout().flush()?;

        let now = chrono::Local::now();
        let state = if snapshot.is_refreshing {
            "refreshing"
        } else {
            "idle"
        };
        println!(
            "Tallybar Watch - {} (refresh: {refresh_interval}s, {state})",
            now.format("%H:%M:%S"),
        );
        println!("{}", "─".repeat(50));
        println!();
        println!("{}", formatter.format_snapshot(&snapshot));
        println!();
        println!("Press Ctrl+C to exit");
    }

    aggregator.stop();
    Ok(())
}
