// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Tallybar CLI - AI coding-assistant quota monitoring from the command line.
//!
//! # Examples
//!
//! ```bash
//! # One-shot usage for all enabled providers
//! tallybar
//!
//! # A single provider
//! tallybar --provider claude
//!
//! # JSON output
//! tallybar --format json --pretty
//!
//! # List providers
//! tallybar providers
//!
//! # Watch mode
//! tallybar watch --interval 30
//! ```

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{providers, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Tallybar CLI - AI coding-assistant quota monitoring.
#[derive(Parser)]
#[command(name = "tallybar")]
#[command(about = "AI coding-assistant quota monitoring CLI")]
#[command(long_about = r#"
Tallybar monitors subscription quota across AI coding assistants.

Supported providers:
  • Claude (claude)
  • Codex (codex)
  • Gemini (gemini)
  • z.ai (zai)
  • Cerebras (cerebras)
  • Kimi (kimi)
  • MiniMax (minimax)

Examples:
  tallybar                       # All enabled providers
  tallybar --provider claude     # Single provider
  tallybar --format json         # JSON output
  tallybar watch --interval 30   # Live updates
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Provider to query (or "all").
    /// Can be comma-separated: "claude,codex"
    #[arg(long, short, global = true)]
    pub provider: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// List known providers.
    #[command(visible_alias = "p")]
    Providers,

    /// Watch for changes (live-updating usage view).
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("tallybar=debug,info")
    } else {
        EnvFilter::new("tallybar=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Providers) => providers::run(&cli),
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        None => {
            // Default to usage command
            usage::run(&usage::UsageArgs::default(), &cli).await
        }
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}
