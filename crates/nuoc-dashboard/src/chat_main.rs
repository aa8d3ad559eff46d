//! Terminal chat widget.
//!
//! Reads lines from stdin and sends them to the chat service, printing the
//! conversation as it grows. `/status` shows the connection state and
//! `/quit` leaves.

use clap::Parser;
use nuoc_client::{ChatClient, Origin, PendingInput};
use nuoc_dashboard::widget::{self, InputLine};
use nuoc_dashboard::{DashboardConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nuoc-chat", about = "Chat with the water-quality assistant")]
struct Args {
    /// Config file; defaults apply when it does not exist
    #[arg(long, env = "NUOC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Chat service WebSocket URL
    #[arg(long, env = "NUOC_CHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Delay before reconnecting, in milliseconds
    #[arg(long, env = "NUOC_RETRY_DELAY_MS")]
    retry_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not interleave with the conversation.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("nuoc=warn".parse()?))
        .init();

    let args = Args::parse();
    let mut config = DashboardConfig::load(&args.config)?.chat;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(delay) = args.retry_delay_ms {
        config.retry_delay_ms = delay;
    }

    let client = ChatClient::spawn(config.client_config()?);
    let mut entries = client.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match entries.recv().await {
                Ok(entry) => println!("{}", widget::render(&entry)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("skipped {} log entries", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tracing::info!("Connecting to {}", config.endpoint);
    client.start()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = PendingInput::new();
    while let Some(line) = lines.next_line().await? {
        match InputLine::parse(&line) {
            InputLine::Quit => break,
            InputLine::Status => {
                println!("{} {}", widget::icon(Origin::SystemNotice), client.state())
            }
            // An empty line retries text a rejected send left staged.
            InputLine::Message(text) if text.trim().is_empty() && !input.is_blank() => {
                client.submit(&mut input).await?;
            }
            InputLine::Message(text) => {
                input.set(text);
                client.submit(&mut input).await?;
            }
        }
    }

    client.stop().await?;
    printer.abort();
    Ok(())
}
