use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chatstream_core::{
    client::ChatClient,
    config::Config,
    error::ChatStreamError,
    session::EndReason,
    stream::ChatEvent,
    telemetry::{TracingSink, set_telemetry_sink},
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "chatstream CLI: send a message and print the reply", long_about = None)]
struct Cli {
    /// Client config (TOML or JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message to a conversation (prints the reply live)
    Send {
        #[arg(short, long, help = "Conversation id")]
        conversation: i64,
        #[arg(short, long, help = "Message from the user")]
        message: String,
        #[arg(long, help = "Wait for the whole reply instead of streaming")]
        no_stream: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    set_telemetry_sink(Arc::new(TracingSink));

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    }
    .with_env_overrides()?;
    let client = ChatClient::from_config(&cfg)?;

    match cli.command {
        Commands::Send {
            conversation,
            message,
            no_stream: true,
        } => {
            let resp = client.send_message(conversation, &message).await?;
            println!("{}", resp.assistant_message.content);
        }
        Commands::Send {
            conversation,
            message,
            no_stream: false,
        } => {
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let mut saw_chunk = false;
            let mut handler = |ev: ChatEvent| match ev {
                ChatEvent::UserMessage(_) => {}
                ChatEvent::Chunk(text) => {
                    saw_chunk = true;
                    print!("{}", text);
                    io::stdout().flush().ok();
                }
                ChatEvent::AssistantMessage(msg) => {
                    if saw_chunk {
                        println!();
                    } else {
                        println!("{}", msg.content);
                    }
                    for c in &msg.citations {
                        eprintln!(
                            "[source: {} #{}]",
                            c.document_title.as_deref().unwrap_or("unknown"),
                            c.chunk_index.map(|i| i.to_string()).unwrap_or_default()
                        );
                    }
                }
                ChatEvent::Error(err) => eprintln!("[error: {}]", err),
                ChatEvent::Done => {}
            };

            match client
                .send_message_stream(conversation, &message, &mut handler, cancel)
                .await
            {
                Ok(summary) if summary.end == EndReason::Cancelled => eprintln!("[cancelled]"),
                Ok(_) => {}
                Err(ChatStreamError::Unauthorized) => {
                    anyhow::bail!("unauthorized: log in again and refresh the session cookie")
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
