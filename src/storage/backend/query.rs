//! Read-only operations for SeaOrmStorage

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::{debug, error};

use super::converters::{model_to_daily_summary, summary_cache_key};
use super::{SeaOrmStorage, retry};
use crate::errors::{AppError, Result};
use crate::storage::models::{ArticlePart, DailySummary, DigestArticle};
use crate::utils::{day_window, digest_window, start_of_day};

use migration::entities::{article, daily_summary};

/// Upper bound of rows returned by [`SeaOrmStorage::article_parts`]
pub const ARTICLE_PART_LIMIT: u64 = 100;

/// Categories left out of the daily digest
pub const SKIPPED_DIGEST_CATEGORIES: &[&str] = &[
    "Vaļasprieki",
    "Virtuve",
    "Laika ziņas",
    "Ceļošana",
    "Cilvēkstāsti",
    "Ikdienai",
    "Ziņas vieglajā valodā",
    "Podkāsti",
    "Vēsture",
    "Sarunas",
    "Skatpunts",
];

fn part_column(part: ArticlePart) -> article::Column {
    match part {
        ArticlePart::Title => article::Column::Title,
        ArticlePart::Summary => article::Column::Summary,
        ArticlePart::Article => article::Column::Article,
    }
}

impl SeaOrmStorage {
    /// One column of the articles published on `date`, oldest first
    pub async fn article_parts(
        &self,
        date: NaiveDate,
        part: ArticlePart,
        category: Option<&str>,
    ) -> Result<Vec<String>> {
        let db = &self.db;
        let (start, end) = day_window(date);
        let column = part_column(part);
        let category = category.map(str::to_owned);

        retry::with_retry(
            &format!("article_parts({}, {})", date, part),
            self.retry_config,
            || {
                let category = category.clone();
                async move {
                    let mut query = article::Entity::find()
                        .select_only()
                        .column(column)
                        .filter(article::Column::PublishedAt.gte(start))
                        .filter(article::Column::PublishedAt.lt(end));
                    if let Some(category) = category {
                        query = query.filter(article::Column::Category.eq(category));
                    }
                    query
                        .order_by_asc(article::Column::PublishedAt)
                        .order_by_asc(article::Column::Id)
                        .limit(ARTICLE_PART_LIMIT)
                        .into_tuple::<String>()
                        .all(db)
                        .await
                }
            },
        )
        .await
        .map_err(|e| {
            error!("Failed to load article {}s for {}: {}", part, date, e);
            AppError::database_operation(format!("Failed to load articles: {}", e))
        })
    }

    /// Articles that go into the digest of `date`
    ///
    /// The window runs until 03:00 of the following day and skips the
    /// lifestyle categories in [`SKIPPED_DIGEST_CATEGORIES`].
    pub async fn articles_for_digest(&self, date: NaiveDate) -> Result<Vec<DigestArticle>> {
        let db = &self.db;
        let (start, end) = digest_window(date);

        let models = retry::with_retry(
            &format!("articles_for_digest({})", date),
            self.retry_config,
            || async move {
                article::Entity::find()
                    .filter(article::Column::PublishedAt.gte(start))
                    .filter(article::Column::PublishedAt.lt(end))
                    .filter(
                        article::Column::Category
                            .is_not_in(SKIPPED_DIGEST_CATEGORIES.iter().copied()),
                    )
                    .order_by_asc(article::Column::PublishedAt)
                    .order_by_asc(article::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| AppError::database_operation(format!("Failed to load articles: {}", e)))?;

        debug!("{} digest articles for {}", models.len(), date);

        Ok(models
            .into_iter()
            .map(|m| DigestArticle {
                url: m.url,
                title: m.title,
                category: m.category,
                article: m.article,
            })
            .collect())
    }

    /// Stored digest of `date`, if any
    pub async fn daily_summary(&self, date: NaiveDate) -> Result<Option<DailySummary>> {
        let key = summary_cache_key(date);
        if let Some(cached) = self.summary_cache.get(&key) {
            return Ok(Some(cached));
        }

        let db = &self.db;
        let summary_date = start_of_day(date);
        let seen_generation = self.summary_generation();

        let model = retry::with_retry(
            &format!("daily_summary({})", date),
            self.retry_config,
            || async move {
                daily_summary::Entity::find()
                    .filter(daily_summary::Column::SummaryDate.eq(summary_date))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| AppError::database_operation(format!("Failed to load summary: {}", e)))?;

        match model {
            Some(model) => {
                let summary = model_to_daily_summary(model)?;
                self.cache_loaded_summary(key, summary.clone(), seen_generation);
                Ok(Some(summary))
            }
            None => Ok(None),
        }
    }

    /// 文章总数（健康检查用）
    pub async fn count_articles(&self) -> Result<u64> {
        article::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to count articles: {}", e)))
    }
}
