//! Agent runtime client tests against a mocked api_server

use httpmock::prelude::*;
use serde_json::json;

use newsdigest::config::AdkConfig;
use newsdigest::errors::AppError;
use newsdigest::services::{AdkClient, Content};

fn client(base_url: &str, retries: u32) -> AdkClient {
    AdkClient::new(&AdkConfig {
        base_url: base_url.to_string(),
        session_max_retries: retries,
        session_backoff_base_ms: 1,
        session_timeout_secs: 5,
        run_timeout_secs: 5,
        ..AdkConfig::default()
    })
}

#[tokio::test]
async fn test_existing_session_is_reused() {
    let server = MockServer::start_async().await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/lsm/users/anna/sessions/s1");
            then.status(200).json_body(json!({"id": "s1", "state": {}}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/apps/lsm/users/anna/sessions/s1");
            then.status(200).json_body(json!({"id": "s1"}));
        })
        .await;

    let session = client(&server.base_url(), 3)
        .get_or_create_session("lsm", "anna", "s1", 3)
        .await
        .unwrap();

    assert_eq!(session["id"], "s1");
    lookup.assert_hits_async(1).await;
    create.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_missing_session_is_created() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/lsm/users/anna/sessions/s2");
            then.status(404).json_body(json!({"detail": "Session not found"}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/apps/lsm/users/anna/sessions/s2")
                .json_body(json!({}));
            then.status(200).json_body(json!({"id": "s2", "created": true}));
        })
        .await;

    let session = client(&server.base_url(), 3)
        .get_or_create_session("lsm", "anna", "s2", 3)
        .await
        .unwrap();

    assert_eq!(session["created"], true);
    create.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_session_gives_up_after_retries() {
    let server = MockServer::start_async().await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/lsm/users/anna/sessions/s3");
            then.status(500);
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/apps/lsm/users/anna/sessions/s3");
            then.status(503);
        })
        .await;

    let err = client(&server.base_url(), 3)
        .get_or_create_session("lsm", "anna", "s3", 3)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert_eq!(err.http_status().as_u16(), 503);
    assert_eq!(
        err.message(),
        "Could not get or create ADK session after 3 attempts."
    );
    lookup.assert_hits_async(3).await;
    create.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_prompt_agent_posts_run_request() {
    let server = MockServer::start_async().await;
    let run = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/run")
                .json_body(json!({
                    "appName": "lsm",
                    "userId": "anna",
                    "sessionId": "s1",
                    "newMessage": {"role": "user", "parts": [{"text": "Sveiki"}]}
                }));
            then.status(200).json_body(json!([{"author": "lsm"}]));
        })
        .await;

    let events = client(&server.base_url(), 1)
        .prompt_agent("lsm", "anna", "s1", &Content::user_text("Sveiki"))
        .await
        .unwrap();

    assert_eq!(events, json!([{"author": "lsm"}]));
    run.assert_async().await;
}

#[tokio::test]
async fn test_prompt_agent_error_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/run");
            then.status(422).body("invalid session");
        })
        .await;

    let err = client(&server.base_url(), 1)
        .prompt_agent("lsm", "anna", "s1", &Content::user_text("hi"))
        .await
        .unwrap_err();

    assert_eq!(err.http_status().as_u16(), 422);
    assert_eq!(
        err.message(),
        "Failed to prompt ADK agent via api_server: invalid session"
    );
}

#[tokio::test]
async fn test_prompt_agent_unreachable() {
    // 端口 9 (discard) 上没有服务
    let adk = client("http://127.0.0.1:9", 1);
    let err = adk
        .prompt_agent("lsm", "anna", "s1", &Content::user_text("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert!(
        err.message()
            .starts_with("Could not connect to ADK api_server run service at http://127.0.0.1:9")
    );
}

#[tokio::test]
async fn test_chat_creates_session_then_prompts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/lsm/users/anna/sessions/new");
            then.status(404);
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/apps/lsm/users/anna/sessions/new");
            then.status(200).json_body(json!({"id": "new"}));
        })
        .await;
    let run = server
        .mock_async(|when, then| {
            when.method(POST).path("/run");
            then.status(200).json_body(json!([]));
        })
        .await;

    let reply = client(&server.base_url(), 2)
        .chat("lsm", "anna", "new", "Kas jauns?")
        .await
        .unwrap();

    assert_eq!(reply, json!([]));
    create.assert_async().await;
    run.assert_async().await;
}
