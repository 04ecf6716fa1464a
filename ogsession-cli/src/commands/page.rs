//! Page command - fetch one in-game page.

use anyhow::Result;
use clap::Args;
use ogsession_core::PageKind;
use ogsession_session::FetchOptions;

use crate::output::{PageOutput, print_json, print_page};
use crate::session::{CliSession, cancel_on_ctrl_c};
use crate::{Cli, OutputFormat};

/// Arguments for the page command.
#[derive(Args)]
pub struct PageArgs {
    /// Component name: overview, supplies, facilities, research, ...
    pub name: String,

    /// Planet to render the page for.
    #[arg(long)]
    pub planet: Option<i64>,

    /// Print the HTML body instead of a summary.
    #[arg(long)]
    pub raw: bool,
}

/// Runs the page command.
pub async fn run(args: &PageArgs, cli: &Cli) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut session = CliSession::open(cli, true).await?;
    session.login(&cancel).await?;

    let mut opts = FetchOptions::fresh();
    if let Some(planet) = args.planet {
        opts = opts.with_planet(planet);
    }
    let page = session
        .handle
        .fetch_page(PageKind::from_component(&args.name), opts, &cancel)
        .await?;

    if args.raw {
        println!("{}", page.body);
        return Ok(());
    }

    let output = PageOutput::from(&page);
    match cli.format {
        OutputFormat::Text => print_page(&output),
        OutputFormat::Json => print_json(&output, cli.pretty)?,
    }
    Ok(())
}
