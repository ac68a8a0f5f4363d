use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::errors::Result;
use crate::storage::{ArticlePart, SeaOrmStorage};

/// Category a short key stands for; unknown keys mean "all categories"
pub fn category_for_key(key: &str) -> Option<&'static str> {
    match key {
        "c1" => Some("Latvijā"),
        "c2" => Some("Pasaulē"),
        _ => None,
    }
}

pub struct ArticleService {
    storage: Arc<SeaOrmStorage>,
}

impl ArticleService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Full texts of the articles published on `date`
    pub async fn articles(&self, date: NaiveDate) -> Result<Vec<String>> {
        let articles = self
            .storage
            .article_parts(date, ArticlePart::Article, None)
            .await?;
        info!("Found {} posts for date {}", articles.len(), date);
        Ok(articles)
    }

    /// Titles published on `date`, optionally narrowed by a category key
    pub async fn titles(&self, date: NaiveDate, category_key: Option<&str>) -> Result<Vec<String>> {
        let category = category_key.and_then(category_for_key);
        let titles = self
            .storage
            .article_parts(date, ArticlePart::Title, category)
            .await?;
        match category {
            Some(category) => info!(
                "Found {} posts for category '{}' and date {}",
                titles.len(),
                category,
                date
            ),
            None => info!("Found {} posts for date {}", titles.len(), date),
        }
        Ok(titles)
    }
}
