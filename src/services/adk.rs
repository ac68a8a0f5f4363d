//! Client for the agent runtime's api_server
//!
//! Sessions live on the runtime side and are addressed by app, user and
//! session id. Before prompting, the session is looked up and created when
//! missing; both steps are retried with exponential backoff.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use ureq::Agent;
use url::Url;

use super::content::Content;
use super::upstream::{self, HttpReply, Outbound, TransportError};
use crate::config::AdkConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunAgentRequest<'a> {
    app_name: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    new_message: &'a Content,
}

#[derive(Clone)]
pub struct AdkClient {
    base_url: String,
    session_agent: Agent,
    run_agent: Agent,
    session_max_retries: u32,
    backoff_base: Duration,
}

impl AdkClient {
    pub fn new(config: &AdkConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_agent: upstream::build_agent(Duration::from_secs(config.session_timeout_secs)),
            run_agent: upstream::build_agent(Duration::from_secs(config.run_timeout_secs)),
            session_max_retries: config.session_max_retries,
            backoff_base: Duration::from_millis(config.session_backoff_base_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session_url(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::config(format!("Invalid adk.base_url '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("adk.base_url '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["apps", app_name, "users", user_id, "sessions", session_id]);
        Ok(url.into())
    }

    /// One get-or-create round; `None` means the attempt should be retried
    async fn try_session_once(&self, url: &str, user_id: &str, session_id: &str) -> Option<Value> {
        match upstream::send(&self.session_agent, Outbound::get(url)).await {
            Ok(reply) if reply.status == 200 => match reply.json() {
                Ok(session) => {
                    info!("Using existing ADK session");
                    return Some(session);
                }
                Err(e) => warn!("ADK session response is not JSON: {}", e),
            },
            Ok(_) => {
                match upstream::send(&self.session_agent, Outbound::post(url, json!({}))).await {
                    Ok(reply) if reply.is_success() => match reply.json() {
                        Ok(session) => {
                            info!("Created new ADK session: {} - {}", user_id, session_id);
                            return Some(session);
                        }
                        Err(e) => warn!("ADK session response is not JSON: {}", e),
                    },
                    Ok(reply) => warn!("ADK session creation returned {}", reply.status),
                    Err(e) => warn!("ADK session creation failed: {}", e),
                }
            }
            Err(e) => warn!("ADK session lookup failed: {}", e),
        }
        None
    }

    /// Return the session, creating it when the runtime doesn't know it
    pub async fn get_or_create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        max_retries: u32,
    ) -> Result<Value> {
        let url = self.session_url(app_name, user_id, session_id)?;

        for attempt in 0..max_retries {
            if let Some(session) = self.try_session_once(&url, user_id, session_id).await {
                return Ok(session);
            }
            info!(
                "Attempt {}: Failed to get or create ADK session.",
                attempt + 1
            );
            if attempt + 1 < max_retries {
                tokio::time::sleep(self.backoff_base * 2u32.saturating_pow(attempt)).await;
            }
        }

        Err(AppError::upstream_unavailable(format!(
            "Could not get or create ADK session after {} attempts.",
            max_retries
        )))
    }

    /// Send `content` to the agent through `/run`
    pub async fn prompt_agent(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        content: &Content,
    ) -> Result<Value> {
        let payload = serde_json::to_value(RunAgentRequest {
            app_name,
            user_id,
            session_id,
            new_message: content,
        })?;
        let request = Outbound::post(format!("{}/run", self.base_url), payload)
            .header("Content-Type", "application/json");

        let reply = upstream::send(&self.run_agent, request)
            .await
            .map_err(|e| self.unreachable(e))?;

        if !reply.is_success() {
            return Err(Self::run_failed(reply));
        }

        info!(
            "ADK api_server run successful. Response status: {}",
            reply.status
        );
        Ok(reply.json()?)
    }

    /// Ensure the session exists, then send `prompt` as user text
    pub async fn chat(
        &self,
        agent_name: &str,
        username: &str,
        session_id: &str,
        prompt: &str,
    ) -> Result<Value> {
        self.get_or_create_session(agent_name, username, session_id, self.session_max_retries)
            .await?;
        self.prompt_agent(agent_name, username, session_id, &Content::user_text(prompt))
            .await
    }

    fn unreachable(&self, err: TransportError) -> AppError {
        error!(
            "Network error connecting to ADK api_server run endpoint: {}",
            err
        );
        AppError::upstream_unavailable(format!(
            "Could not connect to ADK api_server run service at {}: {}",
            self.base_url, err
        ))
    }

    fn run_failed(reply: HttpReply) -> AppError {
        error!("ADK api_server run error: {} - {}", reply.status, reply.body);
        AppError::upstream(
            reply.status,
            format!(
                "Failed to prompt ADK agent via api_server: {}",
                reply.body
            ),
        )
    }
}
