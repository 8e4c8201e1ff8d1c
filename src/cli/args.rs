//! CLI argument definitions using clap
//!
//! Commands:
//! - books-api init --config <path>
//! - books-api serve --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Books API - CRUD over a document-backed book catalogue
#[derive(Parser, Debug)]
#[command(name = "books-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./books.json")]
        config: PathBuf,
    },

    /// Serve the HTTP API until interrupted
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./books.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
