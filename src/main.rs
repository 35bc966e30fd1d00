use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::cors::CorsLayer;
use tracing::info;

use voxrelay::client::{
    AudioClip, AudioParams, ChatClient, MessageKind, RenderSink, StreamReassembler, WavFileSink,
};
use voxrelay::{AppState, RelayConfig};

#[derive(Parser)]
#[command(name = "voxrelay", about = "WebSocket relay for realtime voice and text sessions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server (default)
    Serve,
    /// Connect a terminal chat session through a relay
    Chat {
        /// Relay WebSocket URL; defaults to the local relay endpoint
        #[arg(long)]
        url: Option<String>,
    },
}

/// Render sink that prints chat state to the terminal.
struct StdoutRender;

impl RenderSink for StdoutRender {
    fn append_message(&mut self, sender: &str, text: &str, kind: MessageKind) {
        let arrow = match kind {
            MessageKind::Sent => ">",
            MessageKind::Received => "<",
        };
        println!("{arrow} {sender}: {text}");
    }

    fn update_last_message(&mut self, text: &str) {
        print!("\r< assistant: {text}");
        let _ = std::io::stdout().flush();
    }

    fn append_audio_message(&mut self, sender: &str, clip: &AudioClip) {
        println!("< {sender}: [audio {:.2}s]", clip.duration_secs());
    }

    fn close_last_message(&mut self) {
        println!();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = RelayConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Chat { url } => chat(config, url).await,
    }
}

async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let address = config.address();
    let state = Arc::new(AppState::new(config));

    let app = voxrelay::routes::create_relay_router()
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn chat(config: RelayConfig, url: Option<String>) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| format!("ws://{}/relay", config.address()));

    let reassembler = StreamReassembler::new(
        config.delta_encoding,
        AudioParams {
            sample_rate: config.sample_rate,
            channels: config.channels,
        },
        Box::new(StdoutRender),
        Box::new(WavFileSink::new(config.clip_dir.clone())),
    );

    let client = ChatClient::connect(&url, reassembler).await?;
    println!("connected to {url}; type a message, or an empty line to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        client.send_text(line).await?;
    }

    client.close().await;
    Ok(())
}
