//! Lofi CLI - Headless driver for the background music player
//!
//! Features:
//! - YouTube URL parsing and thumbnail lookup
//! - Playback time formatting
//! - Simulated playback sessions through the real player adapter

use anyhow::Context;
use clap::{Parser, Subcommand};
use lofi_core::AdapterConfig;
use std::path::PathBuf;

mod commands;
mod output;

/// Lofi CLI - Background music player toolkit
#[derive(Parser)]
#[command(name = "lofi")]
#[command(author = "Lofi Contributors")]
#[command(version)]
#[command(about = "Drive the Lofi player core from the command line", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Adapter configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the video id from a YouTube URL
    Parse {
        /// URL to inspect
        url: String,
    },

    /// Format a playback position as M:SS
    Time {
        /// Position in seconds
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },

    /// Play a video on the simulated player
    Play {
        /// Video URL (defaults to the configured default video)
        url: Option<String>,

        /// How long to run the session
        #[arg(short, long, default_value = "10")]
        seconds: u64,

        /// Restart the video when it ends
        #[arg(short, long)]
        repeat: bool,

        /// Skip by this many seconds halfway through
        #[arg(long, allow_negative_numbers = true)]
        skip: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    lofi_core::init();

    let config = match &cli.config {
        Some(path) => AdapterConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AdapterConfig::default(),
    };

    match cli.command {
        Commands::Parse { url } => {
            commands::parse(&url, &cli.format)?;
        }
        Commands::Time { seconds } => {
            commands::time(seconds, &cli.format)?;
        }
        Commands::Play { url, seconds, repeat, skip } => {
            let session = commands::PlayOptions {
                url,
                seconds,
                repeat,
                skip,
            };
            let last = commands::play(config, session, &cli.format).await?;
            tracing::debug!(?last, "Final snapshot");
        }
    }

    Ok(())
}
