//! Stats command - HTTP usage counters after a login.

use anyhow::Result;
use ogsession_core::{Priority, SessionError};
use serde::Serialize;

use crate::output::print_json;
use crate::session::{CliSession, cancel_on_ctrl_c};
use crate::{Cli, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    requests: u64,
    bytes_downloaded: u64,
    bytes_uploaded: u64,
    rps: u64,
    queued_tasks: usize,
    chat_connected: bool,
}

/// Runs the stats command.
pub async fn run(cli: &Cli) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut session = CliSession::open(cli, true).await?;
    session.login(&cancel).await?;

    let (stats, chat_connected) = session
        .handle
        .submit("stats", Priority::Normal, &cancel, |controller, _| {
            Box::pin(async move {
                Ok::<_, SessionError>((controller.client_stats(), controller.chat_connected()))
            })
        })
        .await?;

    let output = StatsOutput {
        requests: stats.requests,
        bytes_downloaded: stats.bytes_downloaded,
        bytes_uploaded: stats.bytes_uploaded,
        rps: stats.rps,
        queued_tasks: session.handle.arbiter().queue_len(),
        chat_connected,
    };

    match cli.format {
        OutputFormat::Text => {
            println!("Requests:   {}", output.requests);
            println!("Downloaded: {} bytes", output.bytes_downloaded);
            println!("Uploaded:   {} bytes", output.bytes_uploaded);
            println!("Rate:       {} req/s", output.rps);
            println!("Queued:     {}", output.queued_tasks);
            println!("Chat:       {}", if output.chat_connected { "connected" } else { "down" });
        }
        OutputFormat::Json => print_json(&output, cli.pretty)?,
    }
    Ok(())
}
