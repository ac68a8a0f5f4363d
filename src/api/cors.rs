//! CORS policy built from `server.cors_allowed_origins`

use actix_cors::Cors;
use tracing::warn;

const CORS_MAX_AGE_SECS: usize = 3600;

/// Log what the configured origins amount to (runs once at startup)
pub fn validate_cors_origins(origins: &[String]) {
    if origins.is_empty() {
        warn!("server.cors_allowed_origins is empty, cross-origin requests are rejected");
    } else if origins.iter().any(|o| o == "*") {
        warn!("CORS allows any origin");
    }
}

/// Empty origins keep the browser's same-origin policy; `*` allows any origin
pub fn build_cors_middleware(origins: &[String]) -> Cors {
    let mut cors = Cors::default();

    if origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
    }

    if origins.is_empty() {
        return cors;
    }

    cors.allowed_methods(vec!["GET", "POST", "HEAD", "OPTIONS"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .allowed_header(actix_web::http::header::ACCEPT)
        .allowed_header("X-Request-ID")
        .expose_headers(vec!["X-Request-ID"])
        .max_age(CORS_MAX_AGE_SECS)
}
