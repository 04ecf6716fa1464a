//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use ogsession_store::{SessionConfig, default_config_dir, default_token_path};
use tracing::info;

use crate::output::print_json;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Write a configuration skeleton.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Show configuration paths.
    Path,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Init { force } => init_config(*force, cli).await,
        ConfigAction::Path => show_paths(cli),
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let path = cli.config_path();
    let config = SessionConfig::load_from(&path).await?;

    match cli.format {
        OutputFormat::Text => {
            println!("ogsession Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Universe:         {} ({})", config.universe, config.language);
            println!("Lobby:            {}", config.lobby);
            println!("Username:         {}", config.username);
            println!("Password from:    ${}", config.password_env);
            if let Some(var) = &config.otp_secret_env {
                println!("OTP secret from:  ${var}");
            }
            println!("Challenge budget: {}", config.max_challenge_retries);
            let rate = if config.requests_per_second == 0 {
                "unlimited".to_string()
            } else {
                format!("{}/s, burst {}", config.requests_per_second, config.burst)
            };
            println!("Request rate:     {rate}");
            println!(
                "Hold timeout:     {}",
                config
                    .hold_timeout_secs
                    .map_or_else(|| "none".to_string(), |s| format!("{s}s"))
            );
            if let Err(e) = config.validate() {
                println!();
                println!("Warning: {e}");
            }
        }
        OutputFormat::Json => print_json(&config, cli.pretty)?,
    }
    Ok(())
}

async fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let path = cli.config_path();
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    SessionConfig::default().save_to(&path).await?;
    info!(path = %path.display(), "Config skeleton written");
    println!("Wrote {}", path.display());
    println!("Set universe and username, then export $OGSESSION_PASSWORD.");
    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = cli.config_path();
    let token_file = default_token_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_file.display());
            println!("Token file:  {}", token_file.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_file.display().to_string(),
                "token_file": token_file.display().to_string(),
            });
            print_json(&paths, cli.pretty)?;
        }
    }
    Ok(())
}
