//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PLSB - Monthly personal finance dashboard
#[derive(Parser)]
#[command(name = "plsb")]
#[command(about = "Monthly personal finance dashboard backed by a spreadsheet", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/plsb/config/dashboard.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Read the finance sheet from a local CSV file
    #[arg(long, global = true, conflicts_with = "sheet_url")]
    pub csv: Option<PathBuf>,

    /// Read the finance sheet from a spreadsheet URL
    ///
    /// Google Sheets share links are turned into CSV export links automatically.
    /// The sheet must be readable without signing in.
    #[arg(long, global = true)]
    pub sheet_url: Option<String>,

    /// Seconds a fetched sheet is reused before fetching again
    #[arg(long, global = true)]
    pub cache_ttl: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the welcome page
    Welcome,

    /// List the months in the sheet
    Months,

    /// Show metrics and breakdown for one month
    Show {
        /// Month name exactly as it appears in the sheet
        month: String,

        /// Print the metrics view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show data source status
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on (defaults to config, then 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to config, then 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Directory containing static files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
