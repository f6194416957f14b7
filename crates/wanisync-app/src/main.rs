use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wanisync_config::Config;
use wanisync_core::sync::WaniSync;

/// Manage your WaniKani lessons as an Anki deck.
#[derive(Debug, Parser)]
#[command(name = "wanisync", version, about)]
struct Cli {
    /// Verbosity level (more -v -> more verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Leave newly synced cards reviewable instead of locking them
    #[arg(long, global = true)]
    disable_suspend_new: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize the Anki deck, models and metadata note
    Init {
        /// Do not download subjects from WaniKani
        #[arg(long)]
        no_download: bool,
    },
    /// Update the Anki deck from WaniKani
    Update,
    /// Process progress - unlock new cards if possible
    Progress,
    /// Trigger Anki's sync with AnkiWeb
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    tracing::debug!("arguments: {cli:?}");

    let config = Config::load()?;
    let wanisync = WaniSync::new(config);

    let suspend_new = !cli.disable_suspend_new;

    match cli.command {
        Command::Init { no_download } => {
            wanisync.create_deck().await?;

            if !no_download {
                // first sync, then unlock whatever is already earned
                wanisync.update_cards(suspend_new).await?;
                wanisync.process_progress().await?;
            }
        }
        Command::Update => wanisync.update_cards(suspend_new).await?,
        Command::Progress => wanisync.process_progress().await?,
        Command::Sync => wanisync.sync_anki().await?,
    }

    Ok(())
}
