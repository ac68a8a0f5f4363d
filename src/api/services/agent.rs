use actix_web::{HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::errors::{AppError, Result};
use crate::services::AdkClient;

#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    pub prompt: String,
    pub username: String,
    pub session_id: String,
}

pub struct AgentService;

impl AgentService {
    /// Make sure the session exists, then forward the prompt to the agent
    pub async fn chat(
        adk: web::Data<Arc<AdkClient>>,
        agent_name: web::Path<String>,
        query: web::Query<AgentQuery>,
    ) -> Result<HttpResponse> {
        let query = query.into_inner();
        let response = adk
            .chat(&agent_name, &query.username, &query.session_id, &query.prompt)
            .await
            .map_err(mask_unexpected)?;

        Ok(HttpResponse::Ok().json(response))
    }
}

/// Upstream and request errors keep their status; the rest become a generic 500
fn mask_unexpected(err: AppError) -> AppError {
    match err {
        AppError::Upstream { .. }
        | AppError::UpstreamUnavailable(_)
        | AppError::Validation(_)
        | AppError::NotFound(_) => err,
        other => {
            error!("An unexpected error occurred: {}", other);
            AppError::agent_response("Internal server error during agent interaction.")
        }
    }
}

pub fn agent_routes() -> actix_web::Scope {
    web::scope("/agent").route("/{agent_name}", web::post().to(AgentService::chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_unexpected() {
        let kept = mask_unexpected(AppError::upstream(404, "gone"));
        assert_eq!(kept.http_status().as_u16(), 404);

        let masked = mask_unexpected(AppError::serialization("expected value"));
        assert_eq!(masked.http_status().as_u16(), 500);
        assert_eq!(
            masked.message(),
            "Internal server error during agent interaction."
        );
    }
}
