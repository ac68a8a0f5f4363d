use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::trace;

pub struct RootService;

impl RootService {
    pub async fn index() -> impl Responder {
        trace!("Received root request");
        HttpResponse::Ok().json(json!({ "message": "Hello" }))
    }

    pub async fn about() -> impl Responder {
        HttpResponse::Ok().json(json!({ "message": "This is the about page." }))
    }
}

pub fn root_routes() -> actix_web::Scope {
    web::scope("")
        .route("/", web::get().to(RootService::index))
        .route("/about", web::get().to(RootService::about))
}
