use clap::Parser;
use forward_bot::config::Config;
use forward_bot::daemon;
use forward_bot::error::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "forward-botd")]
#[command(about = "Forward Bot relay daemon")]
struct Cli {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    db: Option<String>,

    #[arg(long, env = "FORWARD_BOT_TOKEN")]
    token: Option<String>,
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forward_bot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if cli.host.is_some() {
        config.daemon.host = cli.host;
    }
    if cli.port.is_some() {
        config.daemon.port = cli.port;
    }
    if cli.db.is_some() {
        config.storage.db_path = cli.db;
    }
    if cli.token.is_some() {
        config.daemon.token = cli.token;
    }

    daemon::run_with_shutdown(config, shutdown_signal()).await
}
