use std::sync::Arc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use forward_bot::config::Config;
use forward_bot::config_store::SqliteConfigStore;
use forward_bot::error::{ForwardBotError, Result};
use forward_bot::relay::RelayState;

#[derive(Parser, Debug)]
#[command(name = "forward-bot")]
#[command(about = "Inspect and manage the Forward Bot relay state")]
struct Cli {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the stored forward target.
    Status,
    /// Clear the stored forward target. A running forward-botd keeps its
    /// loaded target until restarted; use /disable_forward to stop it live.
    Reset,
    /// Print the effective configuration as JSON.
    ConfigShow,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if cli.db.is_some() {
        config.storage.db_path = cli.db.clone();
    }
    Ok(config)
}

fn open_state(config: &Config) -> Result<RelayState> {
    let store = Arc::new(SqliteConfigStore::open(config.db_path())?);
    RelayState::load(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Status => {
            let state = open_state(&config)?;
            match state.get().await {
                Some(target) => println!(
                    "{} forwarding to {}",
                    style("enabled").green().bold(),
                    style(target).cyan()
                ),
                None => println!("{}", style("disabled").yellow().bold()),
            }
        }
        Commands::Reset => {
            let state = open_state(&config)?;
            state.clear().await?;
            println!("{} forward target cleared", style("ok").green().bold());
            println!(
                "{}",
                style("restart forward-botd for a running daemon to pick this up").dim()
            );
        }
        Commands::ConfigShow => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| ForwardBotError::Serialization(e.to_string()))?;
            println!("{json}");
        }
    }

    Ok(())
}
