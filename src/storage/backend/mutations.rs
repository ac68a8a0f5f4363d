//! Write operations for SeaOrmStorage

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use tracing::info;

use super::converters::{new_article_to_active_model, summaries_to_json, summary_cache_key};
use super::{SeaOrmStorage, retry};
use crate::errors::{AppError, Result};
use crate::storage::models::{ImportReport, NewArticle, Summary, UpsertOutcome};
use crate::utils::start_of_day;

use migration::entities::{article, daily_summary, request_log};

/// URL lookups per query when checking for duplicates
const URL_LOOKUP_CHUNK: usize = 500;

impl SeaOrmStorage {
    pub async fn insert_article(&self, new_article: &NewArticle) -> Result<i64> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("insert_article({})", new_article.url),
            self.retry_config,
            || async move { new_article_to_active_model(new_article).insert(db).await },
        )
        .await
        .map_err(|e| {
            AppError::database_operation(format!(
                "Failed to insert article '{}': {}",
                new_article.url, e
            ))
        })?;

        Ok(model.id)
    }

    /// Insert a batch of articles, skipping URLs that are already stored
    ///
    /// Duplicates inside the batch are skipped as well; the first one wins.
    pub async fn import_articles(&self, articles: &[NewArticle]) -> Result<ImportReport> {
        if articles.is_empty() {
            return Ok(ImportReport::default());
        }

        let mut known: HashSet<String> = HashSet::new();
        let urls: Vec<String> = articles.iter().map(|a| a.url.clone()).collect();
        for chunk in urls.chunks(URL_LOOKUP_CHUNK) {
            let existing: Vec<String> = article::Entity::find()
                .filter(article::Column::Url.is_in(chunk.iter().cloned()))
                .all(&self.db)
                .await
                .map_err(|e| AppError::database_operation(format!("Query failed: {}", e)))?
                .into_iter()
                .map(|m| m.url)
                .collect();
            known.extend(existing);
        }

        let mut report = ImportReport::default();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to begin transaction: {}", e)))?;

        for new_article in articles {
            // 已存在或批内重复的 URL 直接跳过
            if !known.insert(new_article.url.clone()) {
                report.skipped += 1;
                continue;
            }
            new_article_to_active_model(new_article)
                .insert(&txn)
                .await
                .map_err(|e| {
                    AppError::database_operation(format!(
                        "Failed to insert article '{}': {}",
                        new_article.url, e
                    ))
                })?;
            report.inserted += 1;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to commit import: {}", e)))?;

        info!(
            "Imported {} articles ({} skipped)",
            report.inserted, report.skipped
        );
        Ok(report)
    }

    /// Insert or replace the digest of `date`
    pub async fn upsert_summary(
        &self,
        date: NaiveDate,
        summaries: &[Summary],
    ) -> Result<UpsertOutcome> {
        let db = &self.db;
        let summary_date = start_of_day(date);
        let payload = summaries_to_json(summaries)?;

        let outcome = retry::with_retry(
            &format!("upsert_summary({})", date),
            self.retry_config,
            || {
                let payload = payload.clone();
                async move {
                    let now = Utc::now();
                    let txn = db.begin().await?;

                    let existing = daily_summary::Entity::find()
                        .filter(daily_summary::Column::SummaryDate.eq(summary_date))
                        .one(&txn)
                        .await?;

                    let outcome = match existing {
                        Some(model) => {
                            let mut active: daily_summary::ActiveModel = model.into();
                            active.summaries = Set(payload);
                            active.updated_at = Set(now);
                            active.update(&txn).await?;
                            UpsertOutcome::updated()
                        }
                        None => {
                            let model = daily_summary::ActiveModel {
                                id: NotSet,
                                summary_date: Set(summary_date),
                                summaries: Set(payload),
                                updated_at: Set(now),
                            }
                            .insert(&txn)
                            .await?;
                            UpsertOutcome::inserted(model.id)
                        }
                    };

                    txn.commit().await?;
                    Ok(outcome)
                }
            },
        )
        .await
        .map_err(|e| {
            AppError::database_operation(format!("Failed to store summary for {}: {}", date, e))
        })?;

        self.invalidate_summary_cache(&summary_cache_key(date));
        info!(
            "Summary for {} stored (inserted: {})",
            date, outcome.did_upsert
        );
        Ok(outcome)
    }

    /// Keep a raw model response for later inspection
    pub async fn insert_request_log(
        &self,
        model_id: &str,
        payload: &serde_json::Value,
    ) -> Result<i64> {
        let body = serde_json::to_string(payload)?;

        let model = request_log::ActiveModel {
            id: NotSet,
            created_at: Set(Utc::now()),
            model_id: Set(model_id.to_string()),
            payload: Set(body),
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::database_operation(format!("Failed to store request log: {}", e)))?;

        Ok(model.id)
    }
}
