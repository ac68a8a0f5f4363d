//! Daily digest generation

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::content::{Content, Part};
use super::vertex::SummaryModel;
use crate::config::VertexConfig;
use crate::errors::{AppError, Result};
use crate::storage::{SeaOrmStorage, Summary, UpsertOutcome};
use crate::utils::format_compact_date;

/// Structured answer expected from the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentResponse {
    pub summaries: Vec<Summary>,
}

/// Stored digest as served to the website
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySummaryView {
    /// `YYYYMMDD`
    pub date: String,
    pub summaries: Vec<Summary>,
}

pub struct SummaryService {
    storage: Arc<SeaOrmStorage>,
    model: Arc<dyn SummaryModel>,
    system_prompt: String,
    token_limit: u64,
}

impl SummaryService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        model: Arc<dyn SummaryModel>,
        config: &VertexConfig,
    ) -> Self {
        Self {
            storage,
            model,
            system_prompt: config.system_prompt.clone(),
            token_limit: config.token_limit,
        }
    }

    /// Summarise the articles of `date` and store the digest
    ///
    /// `limit` keeps only the first N articles; zero or `None` keeps all.
    pub async fn summarise_day(
        &self,
        date: NaiveDate,
        limit: Option<usize>,
    ) -> Result<UpsertOutcome> {
        let mut articles = self.storage.articles_for_digest(date).await?;
        if articles.is_empty() {
            return Err(AppError::not_found(
                "No articles found in the specified date range.",
            ));
        }

        if let Some(limit) = limit.filter(|l| *l > 0) {
            info!("Article limit: {}", limit);
            articles.truncate(limit);
        }

        let parts = articles
            .iter()
            .map(|article| serde_json::to_string(article).map(Part::text))
            .collect::<serde_json::Result<Vec<_>>>()?;
        let contents = vec![Content::user(parts)];

        let total_tokens = self.model.count_tokens(&contents).await?;
        info!("Input tokens: {}", total_tokens);
        if total_tokens > self.token_limit {
            let msg = format!(
                "Token count {} > {} limit",
                total_tokens, self.token_limit
            );
            error!("{}", msg);
            return Err(AppError::token_limit(msg));
        }

        let response = self.model.generate(&contents, &self.system_prompt).await?;

        // 记录原始响应体（含未建模的字段）
        let payload = if response.raw.is_null() {
            serde_json::to_value(&response)
        } else {
            Ok(response.raw.clone())
        };
        match payload {
            Ok(payload) => {
                if let Err(e) = self
                    .storage
                    .insert_request_log(self.model.model_id(), &payload)
                    .await
                {
                    warn!("Failed to store request log: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize model response: {}", e),
        }

        let answer = response.first_text().unwrap_or_default();
        let parsed: AgentResponse = serde_json::from_str(answer).map_err(|e| {
            error!("Error parsing agent response: {}", e);
            AppError::agent_response("Failed to parse agent response.")
        })?;

        info!("Adding summary to DB");
        self.storage.upsert_summary(date, &parsed.summaries).await
    }

    pub async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummaryView> {
        let stored = self.storage.daily_summary(date).await?.ok_or_else(|| {
            AppError::not_found(format!(
                "No summary found for {}",
                format_compact_date(date)
            ))
        })?;

        Ok(DailySummaryView {
            date: format_compact_date(stored.date),
            summaries: stored.summaries,
        })
    }
}
