mod cache;
mod fetch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vivagenda_core::AppConfig;
use vivagenda_portal::PortalClient;

#[derive(Debug, Parser)]
#[command(name = "vivagenda")]
#[command(about = "Pulls and normalizes the Vivver appointment schedule")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the schedule, served from the snapshot cache when fresh.
    Fetch {
        /// Bypass the snapshot cache and refetch from the portal.
        #[arg(long)]
        refresh: bool,

        /// Write the normalized table to this file as a JSON array.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Authenticate against the portal and report the outcome.
    CheckLogin,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vivagenda_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch { refresh, out } => fetch::run(&config, refresh, out.as_deref()).await,
        Commands::CheckLogin => check_login(&config).await,
    }
}

async fn check_login(config: &AppConfig) -> anyhow::Result<()> {
    let client = PortalClient::from_config(config)?;
    client.authenticate().await?;
    tracing::info!(base_url = %config.base_url, user = %config.credentials.user, "login ok");
    println!("login ok");
    Ok(())
}
