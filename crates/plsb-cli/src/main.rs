//! PLSB CLI - Monthly personal finance dashboard
//!
//! Usage:
//!   plsb --csv finance.csv months         List months in the sheet
//!   plsb --csv finance.csv show March     Metrics for one month
//!   plsb --sheet-url URL serve            Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::resolve_config(
        cli.config.as_deref(),
        cli.csv.as_deref(),
        cli.sheet_url.as_deref(),
        cli.cache_ttl,
    )?;

    match cli.command {
        Commands::Welcome => commands::cmd_welcome(&config.page),
        Commands::Months => {
            let source = commands::open_source(&config)?;
            commands::cmd_months(&source).await
        }
        Commands::Show { month, json } => {
            let source = commands::open_source(&config)?;
            commands::cmd_show(&source, &month, json).await
        }
        Commands::Status => {
            let source = commands::open_source(&config)?;
            commands::cmd_status(&source).await
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            commands::cmd_serve(&config, &host, port, static_dir.as_deref()).await
        }
    }
}
