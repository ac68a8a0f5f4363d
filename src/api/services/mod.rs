pub mod agent;
pub mod articles;
pub mod health;
pub mod lsm;
pub mod root;

use actix_web::{HttpRequest, error, web};

use crate::errors::AppError;

pub use agent::{AgentQuery, AgentService, agent_routes};
pub use articles::{ArticleRoutes, article_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use lsm::{DigestQuery, LsmService, lsm_routes};
pub use root::{RootService, root_routes};

/// Malformed query strings answer 422 with `{"detail": ...}`
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        error::Error::from(AppError::validation(err.to_string()))
    })
}

/// Malformed path segments answer 422 with `{"detail": ...}`
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        error::Error::from(AppError::validation(err.to_string()))
    })
}

/// Register every route and extractor config on an app
///
/// Prefix-less scopes match everything, so they go last.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(query_config())
        .app_data(path_config())
        .service(web::scope("/health").service(health_routes()))
        .service(
            web::scope("/api")
                .service(agent_routes())
                .service(lsm_routes())
                .service(article_routes()),
        )
        .service(root_routes());
}
