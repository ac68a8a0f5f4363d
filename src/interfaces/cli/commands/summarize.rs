//! Summarize command

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::prepare_summary_service;
use crate::utils::parse_compact_date;

pub async fn summarize_day(date: &str, limit: Option<usize>) -> Result<(), CliError> {
    let day = parse_compact_date(date)?;

    let (storage, service) = prepare_summary_service()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    println!("{} {}", "Summarising articles of".yellow(), date.blue());
    let result = service.summarise_day(day, limit).await;
    storage.close().await;
    let outcome = result?;

    if outcome.did_upsert {
        println!(
            "  {} {}",
            "Created digest".green(),
            outcome.upserted_id.unwrap_or_default().cyan()
        );
    } else {
        println!("  {} {}", "Updated digest for".green(), date.cyan());
    }
    Ok(())
}
