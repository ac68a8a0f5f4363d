//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// newsdigest - daily news articles, agent chat and LLM digests
#[derive(Parser)]
#[command(name = "newsdigest")]
#[command(version)]
#[command(about = "News digest API: articles, agent chat proxy and daily summaries", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Summarise one day's articles and store the digest
    Summarize {
        /// Day in YYYYMMDD format
        #[arg(long)]
        date: String,

        /// Only send the first N articles
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Import articles from a JSON file (an array of articles)
    Import {
        /// Input file path
        file_path: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Generate an example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        #[arg(long, short = 'o')]
        output: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// The command to run; no subcommand means `serve`
    pub fn command_or_default(self) -> Commands {
        self.command.unwrap_or(Commands::Serve {
            host: None,
            port: None,
        })
    }
}
