//! Vertex AI client tests against a mocked endpoint

use httpmock::prelude::*;
use serde_json::json;

use newsdigest::config::VertexConfig;
use newsdigest::errors::AppError;
use newsdigest::services::{Content, Part, SummaryModel, VertexClient};

const MODEL_PATH: &str =
    "/v1/projects/lsm-digest/locations/europe-west1/publishers/google/models/gemini-2.5-flash";

fn client(endpoint: &str) -> VertexClient {
    VertexClient::new(&VertexConfig {
        project_id: "lsm-digest".into(),
        endpoint: Some(endpoint.to_string()),
        access_token: Some("test-token".into()),
        thinking_budget: 1024,
        timeout_secs: 5,
        ..VertexConfig::default()
    })
}

#[tokio::test]
async fn test_count_tokens() {
    let server = MockServer::start_async().await;
    let count = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}:countTokens", MODEL_PATH))
                .header("authorization", "Bearer test-token")
                .json_body(json!({
                    "contents": [{"role": "user", "parts": [{"text": "one"}, {"text": "two"}]}]
                }));
            then.status(200).json_body(json!({"totalTokens": 4321}));
        })
        .await;

    let contents = vec![Content::user(vec![Part::text("one"), Part::text("two")])];
    let tokens = client(&server.base_url())
        .count_tokens(&contents)
        .await
        .unwrap();

    assert_eq!(tokens, 4321);
    count.assert_async().await;
}

#[tokio::test]
async fn test_generate_content_request() {
    let server = MockServer::start_async().await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}:generateContent", MODEL_PATH))
                .header("authorization", "Bearer test-token")
                .json_body_partial(
                    r#"{
                        "systemInstruction": {"parts": [{"text": "Summarise in Latvian"}]},
                        "generationConfig": {
                            "responseMimeType": "application/json",
                            "thinkingConfig": {"thinkingBudget": 1024}
                        }
                    }"#,
                );
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"summaries\":[]}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12},
                "modelVersion": "gemini-2.5-flash"
            }));
        })
        .await;

    let contents = vec![Content::user_text("{\"url\":\"https://www.lsm.lv/raksts/a\"}")];
    let response = client(&server.base_url())
        .generate(&contents, "Summarise in Latvian")
        .await
        .unwrap();

    assert_eq!(response.first_text(), Some("{\"summaries\":[]}"));
    assert_eq!(response.model_version.as_deref(), Some("gemini-2.5-flash"));
    assert_eq!(response.raw["usageMetadata"]["promptTokenCount"], 12);
    assert_eq!(response.raw["candidates"][0]["finishReason"], "STOP");
    generate.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_kept() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}:countTokens", MODEL_PATH));
            then.status(429).body("quota exceeded");
        })
        .await;

    let err = client(&server.base_url())
        .count_tokens(&[Content::user_text("x")])
        .await
        .unwrap_err();

    assert_eq!(err.http_status().as_u16(), 429);
    assert_eq!(err.message(), "Vertex AI request failed: quota exceeded");
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let err = client("http://127.0.0.1:9")
        .count_tokens(&[Content::user_text("x")])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_missing_project_id() {
    let vertex = VertexClient::new(&VertexConfig {
        access_token: Some("test-token".into()),
        ..VertexConfig::default()
    });
    let err = vertex
        .count_tokens(&[Content::user_text("x")])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(vertex.model_id(), "gemini-2.5-flash");
}

fn metadata_client(endpoint: &str, metadata_url: String) -> VertexClient {
    VertexClient::new(&VertexConfig {
        project_id: "lsm-digest".into(),
        endpoint: Some(endpoint.to_string()),
        metadata_url: Some(metadata_url),
        timeout_secs: 5,
        ..VertexConfig::default()
    })
}

#[tokio::test]
async fn test_metadata_token_is_cached() {
    let server = MockServer::start_async().await;
    let metadata = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/token")
                .header("Metadata-Flavor", "Google");
            then.status(200).json_body(json!({
                "access_token": "metadata-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await;
    let count = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{}:countTokens", MODEL_PATH))
                .header("authorization", "Bearer metadata-token");
            then.status(200).json_body(json!({"totalTokens": 7}));
        })
        .await;

    let vertex = metadata_client(&server.base_url(), server.url("/token"));
    for _ in 0..2 {
        let tokens = vertex
            .count_tokens(&[Content::user_text("x")])
            .await
            .unwrap();
        assert_eq!(tokens, 7);
    }

    metadata.assert_hits_async(1).await;
    count.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_metadata_error_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/token");
            then.status(404).body("no service account");
        })
        .await;
    let count = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}:countTokens", MODEL_PATH));
            then.status(200).json_body(json!({"totalTokens": 7}));
        })
        .await;

    let err = metadata_client(&server.base_url(), server.url("/token"))
        .count_tokens(&[Content::user_text("x")])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert_eq!(err.http_status().as_u16(), 503);
    assert_eq!(
        err.message(),
        "Metadata server answered 404: no service account"
    );
    count.assert_hits_async(0).await;
}
