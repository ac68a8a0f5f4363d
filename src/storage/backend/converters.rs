use chrono::NaiveDate;
use sea_orm::ActiveValue::{NotSet, Set};

use crate::errors::Result;
use crate::storage::{DailySummary, NewArticle, Summary};
use migration::entities::{article, daily_summary};

/// 将 NewArticle 转换为 ActiveModel（id 由数据库生成）
pub fn new_article_to_active_model(article: &NewArticle) -> article::ActiveModel {
    article::ActiveModel {
        id: NotSet,
        url: Set(article.url.clone()),
        title: Set(article.title.clone()),
        summary: Set(article.summary.clone()),
        article: Set(article.article.clone()),
        category: Set(article.category.clone()),
        published_at: Set(article.published_at),
    }
}

/// 将 Sea-ORM Model 转换为 DailySummary
pub fn model_to_daily_summary(model: daily_summary::Model) -> Result<DailySummary> {
    let summaries: Vec<Summary> = serde_json::from_str(&model.summaries)?;
    Ok(DailySummary {
        date: model.summary_date.date_naive(),
        summaries,
        updated_at: model.updated_at,
    })
}

pub fn summaries_to_json(summaries: &[Summary]) -> Result<String> {
    Ok(serde_json::to_string(summaries)?)
}

/// Cache key of a day's digest
pub fn summary_cache_key(date: NaiveDate) -> String {
    crate::utils::format_compact_date(date)
}
