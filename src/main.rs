//! Hydramon CLI
//!
//! Command-line interface for the hydra alarm monitoring service.

use std::path::PathBuf;

use clap::Parser;
use hydramon::load_config;
use tracing::Level;

#[derive(Parser)]
#[command(name = "hydramon")]
#[command(about = "Hydra alarm monitoring and notification service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.dashboard_port,
        args.log_level
    );

    // Missing or malformed configuration is the only fatal error
    let mut config = load_config(&args.config)?;

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting hydramon service");
    tracing::debug!(
        "Search URL: {}, poll interval: {}s, notifiers: {}",
        config.settings.url,
        config.settings.wait_time_seconds,
        config.notifiers.len()
    );

    hydramon::run(config).await?;

    Ok(())
}
