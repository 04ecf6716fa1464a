//! Manual command - hold the session while a human plays.

use anyhow::Result;
use clap::Args;
use ogsession_core::PageKind;
use ogsession_session::FetchOptions;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::output::{PageOutput, print_page};
use crate::session::{CliSession, cancel_on_ctrl_c};
use crate::Cli;

/// Arguments for the manual command.
#[derive(Args)]
pub struct ManualArgs {
    /// Name the slot is held under.
    #[arg(long, default_value = "Manual Mode")]
    pub name: String,

    /// Pages to refresh while holding the slot.
    #[arg(long, value_delimiter = ',')]
    pub pages: Vec<String>,
}

/// Runs the manual command.
pub async fn run(args: &ManualArgs, cli: &Cli) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut session = CliSession::open(cli, true).await?;
    session.login(&cancel).await?;

    let manual = session.handle.begin_named(&args.name, &cancel).await?;
    info!(holder = %args.name, "Holding session");

    for name in &args.pages {
        let page = manual
            .fetch_page(PageKind::from_component(name), FetchOptions::fresh(), &cancel)
            .await?;
        if !cli.quiet {
            print_page(&PageOutput::from(&page));
        }
    }

    eprintln!("Session held as {:?}. Press Enter to release.", args.name);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tokio::select! {
        _ = lines.next_line() => {}
        () = cancel.cancelled() => {}
    }

    if manual.is_expired() {
        eprintln!("The hold timeout had already released the session.");
    }
    manual.done();
    Ok(())
}
