//! Gemini on Vertex AI
//!
//! The summary flow only needs two calls, `countTokens` and
//! `generateContent`, so they are made directly against the REST API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info};
use ureq::Agent;

use super::content::Content;
use super::upstream::{self, HttpReply, Outbound, TransportError};
use crate::config::VertexConfig;
use crate::errors::{AppError, Result};

/// GCE metadata server token endpoint, used unless `vertex.metadata_url` is set
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_TIMEOUT_SECS: u64 = 5;
/// 令牌提前失效的余量
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Language model that turns a day's articles into a digest
#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn count_tokens(&self, contents: &[Content]) -> Result<u64>;

    async fn generate(
        &self,
        contents: &[Content],
        system_prompt: &str,
    ) -> Result<GenerateContentResponse>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    system_instruction: Content,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn new(contents: &'a [Content], system_prompt: &str, thinking_budget: u32) -> Self {
        Self {
            contents,
            system_instruction: Content::instruction(system_prompt),
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: digest_response_schema(),
                thinking_config: ThinkingConfig { thinking_budget },
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "OFF",
                })
                .collect(),
        }
    }
}

/// Schema of the structured digest the model has to answer with
pub fn digest_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summaries": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": {"type": "STRING"},
                        "articles": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "title": {"type": "STRING"},
                                    "url": {"type": "STRING"},
                                    "ai_summary": {"type": "STRING"}
                                },
                                "required": ["title", "url", "ai_summary"]
                            }
                        }
                    },
                    "required": ["category", "articles"]
                }
            }
        },
        "required": ["summaries"]
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    /// Reply body as received, unknown fields included; `Null` when the
    /// response was not built from an HTTP reply
    #[serde(skip)]
    pub raw: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|part| part.text.as_str())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    lifetime: Duration,
}

struct TokenExpiry;

impl Expiry<&'static str, CachedToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &&'static str,
        value: &CachedToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.lifetime)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Where bearer tokens come from
enum TokenSource {
    Static(String),
    Metadata {
        agent: Agent,
        url: String,
        cache: Cache<&'static str, CachedToken>,
    },
}

impl TokenSource {
    fn metadata(url: String) -> Self {
        TokenSource::Metadata {
            agent: upstream::build_agent(Duration::from_secs(METADATA_TIMEOUT_SECS)),
            url,
            cache: Cache::builder()
                .max_capacity(1)
                .expire_after(TokenExpiry)
                .build(),
        }
    }

    async fn token(&self) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata { agent, url, cache } => cache
                .try_get_with("default", Self::fetch_metadata_token(agent, url))
                .await
                .map(|cached| cached.token)
                .map_err(|e| (*e).clone()),
        }
    }

    async fn fetch_metadata_token(agent: &Agent, url: &str) -> Result<CachedToken> {
        debug!("Requesting access token from the metadata server");
        let request = Outbound::get(url).header("Metadata-Flavor", "Google");
        let reply = upstream::send(agent, request).await.map_err(|e| {
            AppError::upstream_unavailable(format!(
                "Could not get an access token from the metadata server: {}",
                e
            ))
        })?;
        if !reply.is_success() {
            return Err(AppError::upstream_unavailable(format!(
                "Metadata server answered {}: {}",
                reply.status, reply.body
            )));
        }
        let token: MetadataToken = serde_json::from_str(&reply.body)?;
        Ok(CachedToken {
            token: token.access_token,
            lifetime: Duration::from_secs(
                token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS),
            ),
        })
    }
}

pub struct VertexClient {
    endpoint: String,
    project_id: String,
    region: String,
    model_id: String,
    token_count_model: String,
    thinking_budget: u32,
    agent: Agent,
    tokens: Arc<TokenSource>,
}

impl VertexClient {
    pub fn new(config: &VertexConfig) -> Self {
        let tokens = match &config.access_token {
            Some(token) if !token.is_empty() => TokenSource::Static(token.clone()),
            _ => TokenSource::metadata(
                config
                    .metadata_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| METADATA_TOKEN_URL.to_string()),
            ),
        };

        Self {
            endpoint: config.effective_endpoint(),
            project_id: config.project_id.clone(),
            region: config.region.clone(),
            model_id: config.model_id.clone(),
            token_count_model: config.token_count_model.clone(),
            thinking_budget: config.thinking_budget,
            agent: upstream::build_agent(Duration::from_secs(config.timeout_secs)),
            tokens: Arc::new(tokens),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> Result<String> {
        if self.project_id.is_empty() {
            return Err(AppError::config("vertex.project_id is not set"));
        }
        Ok(format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.endpoint, self.project_id, self.region, model, method
        ))
    }

    async fn post(&self, url: String, body: Value) -> Result<HttpReply> {
        let token = self.tokens.token().await?;
        let reply = upstream::send(&self.agent, Outbound::post(url, body).bearer(&token))
            .await
            .map_err(|e| self.unreachable(e))?;

        if !reply.is_success() {
            error!("Vertex AI error: {} - {}", reply.status, reply.body);
            return Err(AppError::upstream(
                reply.status,
                format!("Vertex AI request failed: {}", reply.body),
            ));
        }
        Ok(reply)
    }

    fn unreachable(&self, err: TransportError) -> AppError {
        error!("Network error connecting to Vertex AI: {}", err);
        AppError::upstream_unavailable(format!(
            "Could not connect to Vertex AI at {}: {}",
            self.endpoint, err
        ))
    }
}

#[async_trait]
impl SummaryModel for VertexClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn count_tokens(&self, contents: &[Content]) -> Result<u64> {
        let url = self.model_url(&self.token_count_model, "countTokens")?;
        let body = serde_json::to_value(CountTokensRequest { contents })?;
        let reply = self.post(url, body).await?;
        let counted: CountTokensResponse = serde_json::from_str(&reply.body)?;
        Ok(counted.total_tokens)
    }

    async fn generate(
        &self,
        contents: &[Content],
        system_prompt: &str,
    ) -> Result<GenerateContentResponse> {
        let url = self.model_url(&self.model_id, "generateContent")?;
        let body = serde_json::to_value(GenerateContentRequest::new(
            contents,
            system_prompt,
            self.thinking_budget,
        ))?;
        let reply = self.post(url, body).await?;
        let raw: Value = serde_json::from_str(&reply.body)?;
        let mut response: GenerateContentResponse = serde_json::from_value(raw.clone())?;
        response.raw = raw;
        info!(
            "Vertex AI generated {} candidate(s) with {}",
            response.candidates.len(),
            self.model_id
        );
        Ok(response)
    }
}
