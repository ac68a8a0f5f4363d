use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Selectable text column of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArticlePart {
    Title,
    Summary,
    Article,
}

/// Article as delivered by the scraper, before it gets an id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub article: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
}

/// The fields of an article the summary model gets to see
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestArticle {
    pub url: String,
    pub title: String,
    pub category: String,
    pub article: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryArticle {
    pub title: String,
    pub url: String,
    pub ai_summary: String,
}

/// Summaries of one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub category: String,
    pub articles: Vec<SummaryArticle>,
}

/// Stored digest of one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub summaries: Vec<Summary>,
    pub updated_at: DateTime<Utc>,
}

/// Result of writing a day's digest
///
/// `did_upsert` is set when a new row was created; `upserted_id` then holds
/// its id. Rewriting an existing day reports one matched and one modified row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub did_upsert: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

impl UpsertOutcome {
    pub fn inserted(id: i64) -> Self {
        Self {
            did_upsert: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id.to_string()),
        }
    }

    pub fn updated() -> Self {
        Self {
            did_upsert: false,
            matched_count: 1,
            modified_count: 1,
            upserted_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}
