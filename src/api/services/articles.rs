use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;

use crate::errors::{AppError, Result};
use crate::services::ArticleService;
use crate::utils::{DATE_FORMAT_ERROR, is_compact_date, parse_compact_date};

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// `Ok(None)` when the segment has eight digits but names no calendar day
fn path_date(raw: &str) -> Result<Option<NaiveDate>> {
    if !is_compact_date(raw) {
        return Err(AppError::validation(format!(
            "date '{}' must match ^\\d{{8}}$",
            raw
        )));
    }
    Ok(parse_compact_date(raw).ok())
}

fn invalid_date() -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type(JSON_UTF8)
        .json(json!({ "error": DATE_FORMAT_ERROR }))
}

pub struct ArticleRoutes;

impl ArticleRoutes {
    pub async fn articles(
        service: web::Data<Arc<ArticleService>>,
        date: web::Path<String>,
    ) -> Result<HttpResponse> {
        let Some(date) = path_date(&date)? else {
            return Ok(invalid_date());
        };

        let articles = service.articles(date).await?;
        Ok(HttpResponse::Ok()
            .content_type(JSON_UTF8)
            .json(json!({ "articles": articles })))
    }

    pub async fn titles(
        service: web::Data<Arc<ArticleService>>,
        date: web::Path<String>,
    ) -> Result<HttpResponse> {
        let Some(date) = path_date(&date)? else {
            return Ok(invalid_date());
        };

        let titles = service.titles(date, None).await?;
        Ok(HttpResponse::Ok()
            .content_type(JSON_UTF8)
            .json(json!({ "titles": titles })))
    }

    pub async fn titles_by_category(
        service: web::Data<Arc<ArticleService>>,
        path: web::Path<(String, String)>,
    ) -> Result<HttpResponse> {
        let (category_key, date) = path.into_inner();
        let Some(date) = path_date(&date)? else {
            return Ok(invalid_date());
        };

        let titles = service.titles(date, Some(&category_key)).await?;
        Ok(HttpResponse::Ok()
            .content_type(JSON_UTF8)
            .json(json!({ "titles": titles })))
    }
}

pub fn article_routes() -> actix_web::Scope {
    web::scope("")
        .route("/articles/{date}", web::get().to(ArticleRoutes::articles))
        .route("/titles/{date}", web::get().to(ArticleRoutes::titles))
        .route(
            "/titles/{category_key}/{date}",
            web::get().to(ArticleRoutes::titles_by_category),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_date() {
        assert_eq!(
            path_date("20250504").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 4)
        );
        assert_eq!(path_date("20250230").unwrap(), None);
        assert!(matches!(path_date("2025-05-04"), Err(AppError::Validation(_))));
        assert!(matches!(path_date("202505041"), Err(AppError::Validation(_))));
    }
}
