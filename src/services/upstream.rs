//! Blocking HTTP plumbing for the upstream services
//!
//! `ureq` is synchronous, so every call is moved onto tokio's blocking pool.
//! Agents are built with `http_status_as_error(false)`: callers get non-2xx
//! replies back as data and decide themselves what they mean.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::trace;
use ureq::Agent;

/// Build an agent whose requests give up after `timeout`
pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Status and raw body of an upstream reply
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// The request never produced a reply (DNS, connect, timeout, ...)
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for TransportError {}

/// Outbound request description
#[derive(Debug, Clone)]
pub struct Outbound {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Outbound {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }
}

/// 同步发送（在 spawn_blocking 中调用）
fn send_sync(agent: &Agent, request: &Outbound) -> Result<HttpReply, ureq::Error> {
    trace!("{:?} {}", request.method, request.url);

    let response = match request.method {
        Method::Get => {
            let mut builder = agent.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()?
        }
        Method::Post => {
            let mut builder = agent.post(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match &request.body {
                Some(body) => builder.send_json(body)?,
                None => builder.send_empty()?,
            }
        }
    };

    let status = response.status().as_u16();
    let body = response.into_body().read_to_string()?;
    Ok(HttpReply { status, body })
}

/// Send `request` on the blocking pool
pub async fn send(agent: &Agent, request: Outbound) -> Result<HttpReply, TransportError> {
    let agent = agent.clone();
    tokio::task::spawn_blocking(move || send_sync(&agent, &request))
        .await
        .map_err(|e| TransportError(format!("request task failed: {}", e)))?
        .map_err(|e| TransportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_success_range() {
        let ok = HttpReply {
            status: 204,
            body: String::new(),
        };
        let not_found = HttpReply {
            status: 404,
            body: "{}".into(),
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }

    #[test]
    fn test_outbound_builder() {
        let request = Outbound::post("http://localhost/run", json!({"a": 1})).bearer("tok");
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.headers,
            vec![("Authorization".to_string(), "Bearer tok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_send_reports_transport_error() {
        let agent = build_agent(Duration::from_millis(500));
        // 端口 1 上没有服务
        let result = send(&agent, Outbound::get("http://127.0.0.1:1/unreachable")).await;
        assert!(result.is_err());
    }
}
