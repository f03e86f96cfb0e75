mod cli;
mod config;
mod error;
mod models;
mod nest;
mod poller;
mod transport;
mod utils;

use log::{error, info, warn};
use tokio::sync::watch;

use cli::Cli;
use config::NestConfig;
use poller::{report_lines, run_session};
use transport::HttpTransport;

/// Info by default; a `RUST_LOG` value replaces that default.
fn logger_builder(rust_log: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs();
    if let Some(filters) = rust_log {
        builder.parse_filters(filters);
    }
    builder
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    logger_builder(std::env::var("RUST_LOG").ok().as_deref()).init();

    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(e) => {
            error!("Failed to parse arguments: {}", e);
            return Err(e.into());
        }
    };

    // Load configuration
    let config = match NestConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let transport = HttpTransport::new(config.http_timeout)?;

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, stopping after the current cycle");
                let _ = tx.send(true);
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let result = run_session(
        &transport,
        &config,
        &cli.username,
        &cli.password,
        cli.schedule(),
        &mut rx,
        |report| {
            for line in report_lines(report) {
                println!("{}", line);
            }
        },
    )
    .await;

    match result {
        Ok(cycles) => {
            info!("Program completed successfully after {} cycles", cycles);
            Ok(())
        }
        Err(e) => {
            error!("Fatal error: {}", e);
            Err(e.into())
        }
    }
}
