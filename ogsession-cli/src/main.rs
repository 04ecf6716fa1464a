// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! ogsession CLI - log into an OGame universe and drive the session.
//!
//! # Examples
//!
//! ```bash
//! # Write a config skeleton, then edit universe and username
//! ogsession config init
//!
//! # Log in and print the session summary
//! OGSESSION_PASSWORD=... ogsession login
//!
//! # Fetch a page for a planet
//! ogsession page supplies --planet 33677371
//!
//! # Hold the session for manual play until Enter is pressed
//! ogsession manual
//!
//! # HTTP usage after a login
//! ogsession stats --format json
//! ```

mod commands;
mod output;
mod session;
mod solver;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, login, manual, page, stats};

// ============================================================================
// CLI Definition
// ============================================================================

/// ogsession CLI - OGame session management.
#[derive(Parser)]
#[command(name = "ogsession")]
#[command(about = "Log into OGame universes and drive the session")]
#[command(long_about = r#"
ogsession logs into an OGame universe through the Gameforge lobby and keeps
the session alive: it solves challenges interactively, re-logs in when the
game drops the session, and serializes all work on one account.

Secrets are read from environment variables named in the config file
(OGSESSION_PASSWORD by default).

Examples:
  ogsession config init          # Write a config skeleton
  ogsession login                # Log in and print the session
  ogsession page overview        # Fetch an in-game page
  ogsession manual               # Hold the session until Enter
"#)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the user config directory).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and print the session summary.
    #[command(visible_alias = "l")]
    Login(login::LoginArgs),

    /// Fetch an in-game page.
    #[command(visible_alias = "p")]
    Page(page::PageArgs),

    /// Hold the session for manual play.
    #[command(visible_alias = "m")]
    Manual(manual::ManualArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),

    /// Log in and show HTTP usage counters.
    Stats,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Config file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(ogsession_store::SessionConfig::default_path)
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("ogsession=debug,info")
    } else {
        EnvFilter::new("ogsession=warn")
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
        Commands::Login(args) => login::run(args, &cli).await,
        Commands::Page(args) => page::run(args, &cli).await,
        Commands::Manual(args) => manual::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
        Commands::Stats => stats::run(&cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }

    Ok(())
}
