//! Login command - authenticate and print the session.

use anyhow::Result;
use clap::Args;

use crate::output::{SessionOutput, print_json, print_session};
use crate::session::{CliSession, cancel_on_ctrl_c};
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args, Default)]
pub struct LoginArgs {
    /// Ignore the saved bearer token and submit credentials.
    #[arg(long)]
    pub fresh: bool,
}

/// Runs the login command.
pub async fn run(args: &LoginArgs, cli: &Cli) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut session = CliSession::open(cli, !args.fresh).await?;
    let snapshot = session.login(&cancel).await?;

    let output = SessionOutput::from(&snapshot);
    match cli.format {
        OutputFormat::Text => print_session(&output),
        OutputFormat::Json => print_json(&output, cli.pretty)?,
    }
    Ok(())
}
