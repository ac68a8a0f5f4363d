//! HTTP API tests
//!
//! Routes are mounted the way the server mounts them, on top of a
//! temporary SQLite database, a scripted summary model and a mocked agent
//! runtime.

use std::sync::{Arc, Once};

use actix_web::{App, http::StatusCode, test, web};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

use newsdigest::api::services::AppStartTime;
use newsdigest::config::{AdkConfig, VertexConfig, init_config};
use newsdigest::errors::Result;
use newsdigest::services::{
    AdkClient, ArticleService, Content, GenerateContentResponse, SummaryModel, SummaryService,
};
use newsdigest::storage::{NewArticle, SeaOrmStorage};

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

const DIGEST_JSON: &str = r#"{"summaries":[{"category":"Latvijā","articles":[{"title":"Title a","url":"https://www.lsm.lv/raksts/a","ai_summary":"Short"}]}]}"#;

struct ScriptedModel {
    reply: String,
}

#[async_trait]
impl SummaryModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn count_tokens(&self, _contents: &[Content]) -> Result<u64> {
        Ok(10)
    }

    async fn generate(
        &self,
        _contents: &[Content],
        _system_prompt: &str,
    ) -> Result<GenerateContentResponse> {
        Ok(serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": self.reply}]}}]
        }))
        .unwrap())
    }
}

struct TestState {
    storage: Arc<SeaOrmStorage>,
    articles: Arc<ArticleService>,
    summaries: Arc<SummaryService>,
    adk: Arc<AdkClient>,
    _dir: TempDir,
}

async fn create_state(adk_base_url: &str) -> TestState {
    init_test_config();

    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );

    let model = Arc::new(ScriptedModel {
        reply: DIGEST_JSON.to_string(),
    });
    let vertex = VertexConfig {
        system_prompt: "Summarise".into(),
        ..VertexConfig::default()
    };
    let adk = AdkClient::new(&AdkConfig {
        base_url: adk_base_url.to_string(),
        session_max_retries: 1,
        session_backoff_base_ms: 1,
        ..AdkConfig::default()
    });

    TestState {
        articles: Arc::new(ArticleService::new(storage.clone())),
        summaries: Arc::new(SummaryService::new(storage.clone(), model, &vertex)),
        adk: Arc::new(adk),
        storage,
        _dir: dir,
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.storage.clone()))
                .app_data(web::Data::new($state.articles.clone()))
                .app_data(web::Data::new($state.summaries.clone()))
                .app_data(web::Data::new($state.adk.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: Utc::now(),
                }))
                .configure(newsdigest::api::configure),
        )
        .await
    };
}

async fn seed_articles(storage: &SeaOrmStorage) {
    let rows = [
        ("a", "Latvijā", 8),
        ("b", "Pasaulē", 9),
        ("c", "Sports", 10),
    ];
    for (slug, category, hour) in rows {
        storage
            .insert_article(&NewArticle {
                url: format!("https://www.lsm.lv/raksts/{}", slug),
                title: format!("Title {}", slug),
                summary: String::new(),
                article: format!("Body {}", slug),
                category: category.to_string(),
                published_at: Utc.with_ymd_and_hms(2025, 5, 4, hour, 0, 0).unwrap(),
            })
            .await
            .unwrap();
    }
}

// =============================================================================
// Root & health
// =============================================================================

#[actix_rt::test]
async fn test_root_and_about() {
    let state = create_state("http://127.0.0.1:9").await;
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"message": "Hello"}));

    let req = test::TestRequest::get().uri("/about").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"message": "This is the about page."}));
}

#[actix_rt::test]
async fn test_health_endpoints() {
    let state = create_state("http://127.0.0.1:9").await;
    seed_articles(&state.storage).await;
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["storage"]["backend"], "sqlite");
    assert_eq!(body["checks"]["storage"]["articles_count"], 3);

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "OK");

    let req = test::TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// =============================================================================
// Articles & titles
// =============================================================================

#[actix_rt::test]
async fn test_articles_by_date() {
    let state = create_state("http://127.0.0.1:9").await;
    seed_articles(&state.storage).await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/articles/20250504")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"articles": ["Body a", "Body b", "Body c"]}));

    let req = test::TestRequest::get()
        .uri("/api/articles/20250505")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"articles": []}));
}

#[actix_rt::test]
async fn test_article_date_validation() {
    let state = create_state("http://127.0.0.1:9").await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/articles/2025-05-04")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/titles/20250230")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Invalid date format. Use YYYYMMDD."}));
}

#[actix_rt::test]
async fn test_titles_by_category() {
    let state = create_state("http://127.0.0.1:9").await;
    seed_articles(&state.storage).await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/titles/20250504")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"titles": ["Title a", "Title b", "Title c"]}));

    let req = test::TestRequest::get()
        .uri("/api/titles/c1/20250504")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"titles": ["Title a"]}));

    let req = test::TestRequest::get()
        .uri("/api/titles/c2/20250504")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"titles": ["Title b"]}));

    // 未知分类键返回全部
    let req = test::TestRequest::get()
        .uri("/api/titles/c9/20250504")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["titles"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Daily digest
// =============================================================================

#[actix_rt::test]
async fn test_daily_summary_lifecycle() {
    let state = create_state("http://127.0.0.1:9").await;
    seed_articles(&state.storage).await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/lsm/summary/daily?date=20250504")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "No summary found for 20250504");

    let req = test::TestRequest::post()
        .uri("/api/lsm/summary/daily?date=20250504")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["did_upsert"], true);
    assert_eq!(body["matched_count"], 0);

    let req = test::TestRequest::post()
        .uri("/api/lsm/summary/daily?date=20250504&limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["did_upsert"], false);
    assert_eq!(body["modified_count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/lsm/summary/daily?date=20250504")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["date"], "20250504");
    assert_eq!(body["summaries"][0]["category"], "Latvijā");
    assert_eq!(body["summaries"][0]["articles"][0]["ai_summary"], "Short");
}

#[actix_rt::test]
async fn test_summarise_day_without_articles() {
    let state = create_state("http://127.0.0.1:9").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/lsm/summary/daily?date=20250101")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "No articles found in the specified date range."
    );
}

#[actix_rt::test]
async fn test_daily_summary_query_validation() {
    let state = create_state("http://127.0.0.1:9").await;
    let app = init_app!(state);

    for uri in [
        "/api/lsm/summary/daily",
        "/api/lsm/summary/daily?date=2025",
        "/api/lsm/summary/daily?date=20250504&limit=many",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/api/lsm/summary/daily?date=20251340")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Agent proxy
// =============================================================================

#[actix_rt::test]
async fn test_agent_chat_forwards_run_response() {
    let server = MockServer::start_async().await;
    let session = server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/news_agent/users/anna/sessions/s1");
            then.status(200).json_body(json!({"id": "s1"}));
        })
        .await;
    let run = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/run")
                .json_body_partial(r#"{"appName":"news_agent","userId":"anna","sessionId":"s1","newMessage":{"role":"user","parts":[{"text":"Kas jauns?"}]}}"#);
            then.status(200)
                .json_body(json!([{"content": {"parts": [{"text": "Viss kārtībā"}]}}]));
        })
        .await;

    let state = create_state(&server.base_url()).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/agent/news_agent?prompt=Kas%20jauns%3F&username=anna&session_id=s1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["content"]["parts"][0]["text"], "Viss kārtībā");

    session.assert_async().await;
    run.assert_async().await;
}

#[actix_rt::test]
async fn test_agent_chat_keeps_upstream_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/missing/users/anna/sessions/s1");
            then.status(200).json_body(json!({"id": "s1"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/run");
            then.status(404).body("Agent not found");
        })
        .await;

    let state = create_state(&server.base_url()).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/agent/missing?prompt=hi&username=anna&session_id=s1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Failed to prompt ADK agent via api_server: Agent not found"
    );
}

#[actix_rt::test]
async fn test_agent_chat_session_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/apps/news_agent/users/anna/sessions/s1");
            then.status(500);
        })
        .await;

    let state = create_state(&server.base_url()).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/agent/news_agent?prompt=hi&username=anna&session_id=s1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Could not get or create ADK session after 1 attempts."
    );
}

#[actix_rt::test]
async fn test_agent_chat_requires_query() {
    let state = create_state("http://127.0.0.1:9").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/agent/news_agent?prompt=hi&username=anna")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::get()
        .uri("/api/agent/news_agent?prompt=hi&username=anna&session_id=s1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}
