//! CLI module for Consulta.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Consulta - Ask questions about your PDF documents
///
/// Indexes a fixed set of PDF documents and answers questions about them
/// with a hosted LLM, grounded only in what the documents say.
#[derive(Parser, Debug)]
#[command(name = "consulta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CONSULTA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check API keys, documents and configuration
    Doctor,

    /// Extract passages from the configured documents without indexing them
    Ingest,

    /// Ask a question about the documents
    Ask {
        /// The question to ask
        question: String,

        /// Number of passages to ground the answer on
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the passages most relevant to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },

    /// Start the HTTP server with the chat UI
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
