use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::{AppError, Result};
use crate::services::SummaryService;
use crate::utils::{is_compact_date, parse_compact_date};

#[derive(Debug, Deserialize)]
pub struct DigestQuery {
    pub date: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl DigestQuery {
    fn parsed_date(&self) -> Result<NaiveDate> {
        if !is_compact_date(&self.date) {
            return Err(AppError::validation(format!(
                "date '{}' must match ^\\d{{8}}$",
                self.date
            )));
        }
        parse_compact_date(&self.date)
    }
}

pub struct LsmService;

impl LsmService {
    /// Summarise a day's articles and store the digest
    pub async fn summarise_daily(
        service: web::Data<Arc<SummaryService>>,
        query: web::Query<DigestQuery>,
    ) -> Result<HttpResponse> {
        let date = query.parsed_date()?;
        let outcome = service.summarise_day(date, query.limit).await?;
        Ok(HttpResponse::Ok().json(outcome))
    }

    pub async fn daily_summary(
        service: web::Data<Arc<SummaryService>>,
        query: web::Query<DigestQuery>,
    ) -> Result<HttpResponse> {
        let date = query.parsed_date()?;
        let view = service.daily_summary(date).await?;
        Ok(HttpResponse::Ok().json(view))
    }
}

pub fn lsm_routes() -> actix_web::Scope {
    web::scope("/lsm").service(
        web::resource("/summary/daily")
            .route(web::post().to(LsmService::summarise_daily))
            .route(web::get().to(LsmService::daily_summary)),
    )
}
