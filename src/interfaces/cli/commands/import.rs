//! Import command

use std::path::Path;

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::storage::{NewArticle, StorageFactory};

/// Read a JSON array of articles
pub fn read_articles_file(file_path: &str) -> Result<Vec<NewArticle>, CliError> {
    if !Path::new(file_path).exists() {
        return Err(CliError::CommandError(format!(
            "File not found: {}",
            file_path
        )));
    }
    let content = std::fs::read_to_string(file_path)
        .map_err(|e| CliError::CommandError(format!("Failed to read {}: {}", file_path, e)))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::ParseError(format!("Invalid articles file {}: {}", file_path, e)))
}

pub async fn import_articles(file_path: &str) -> Result<(), CliError> {
    let articles = read_articles_file(file_path)?;
    println!(
        "{} {} {}",
        "Importing".yellow(),
        articles.len().to_string().cyan(),
        "articles...".yellow()
    );

    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    let result = storage.import_articles(&articles).await;
    storage.close().await;
    let report = result?;

    println!(
        "  {} {} {} {}",
        "Inserted".green(),
        report.inserted.to_string().green().bold(),
        "skipped".dimmed(),
        report.skipped.to_string().dimmed()
    );
    Ok(())
}
