//! CLI interface module

pub mod commands;

use crate::cli::{Commands, ConfigCommands};
use commands::{config_generate, import_articles, summarize_day};
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::AppError> for CliError {
    fn from(err: crate::errors::AppError) -> Self {
        match err {
            crate::errors::AppError::DatabaseConnection(msg)
            | crate::errors::AppError::DatabaseOperation(msg) => CliError::StorageError(msg),
            crate::errors::AppError::DateParse(msg)
            | crate::errors::AppError::Validation(msg)
            | crate::errors::AppError::Serialization(msg) => CliError::ParseError(msg),
            other => CliError::CommandError(other.format_simple()),
        }
    }
}

/// Run an offline command
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Summarize { date, limit } => summarize_day(&date, limit).await,
        Commands::Import { file_path } => import_articles(&file_path).await,
        Commands::Config {
            action: ConfigCommands::Generate { output, force },
        } => config_generate(output, force).await,
        Commands::Serve { .. } => Err(CliError::CommandError(
            "serve is not an offline command".to_string(),
        )),
    }
}
