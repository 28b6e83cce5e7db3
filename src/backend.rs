//! HTTP client for the SuperAgent backend.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Shown in place of an agent reply whose `response` field is missing.
pub const NO_RESPONSE_FALLBACK: &str = "No response received.";

/// Result of one outbound agent request.
pub type SubmissionOutcome = Result<AgentReply>;

/// Request body for `POST /agent/query`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentQuery {
    pub prompt: String,
}

/// Response body from `POST /agent/query`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentReply {
    pub response: Option<String>,
}

impl AgentReply {
    /// The reply text. The backend sends `""` when its model returns
    /// nothing, so an empty `response` is treated the same as an absent
    /// one and both map to the fixed fallback.
    pub fn text(&self) -> &str {
        self.response
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(NO_RESPONSE_FALLBACK)
    }
}

/// Response body from `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// The one outbound call the submission cycle depends on. Split out so
/// tests can drive the controller with a scripted double.
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn query(&self, prompt: &str) -> SubmissionOutcome;
}

/// reqwest-backed client for a configured SuperAgent backend.
#[derive(Debug, Clone)]
pub struct AgentBackend {
    client: reqwest::Client,
    base_url: String,
}

impl AgentBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ping the backend's health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the SuperAgent backend")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Health check returned status {}",
                response.status()
            ));
        }

        let body = response
            .text()
            .await
            .context("Failed to read health response")?;
        serde_json::from_str(&body).context("Failed to parse health response")
    }
}

#[async_trait]
impl AgentApi for AgentBackend {
    async fn query(&self, prompt: &str) -> SubmissionOutcome {
        let url = format!("{}/agent/query", self.base_url);
        let query = AgentQuery {
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&query)
            .send()
            .await
            .context("Failed to reach the SuperAgent backend")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Agent request returned status {}",
                response.status()
            ));
        }

        let body = response
            .text()
            .await
            .context("Failed to read agent response")?;
        serde_json::from_str(&body).context("Failed to parse agent response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_query_serializes_the_prompt_field() {
        let query = AgentQuery {
            prompt: "Buy AAPL?".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"prompt": "Buy AAPL?"})
        );
    }

    #[test]
    fn reply_text_returns_the_response_field() {
        let reply: AgentReply = serde_json::from_str(r#"{"response": "Yes, 10 shares."}"#).unwrap();
        assert_eq!(reply.text(), "Yes, 10 shares.");
    }

    #[test]
    fn reply_text_falls_back_when_the_field_is_missing() {
        let reply: AgentReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.text(), NO_RESPONSE_FALLBACK);
    }

    #[test]
    fn reply_text_falls_back_on_null_or_blank_responses() {
        let null: AgentReply = serde_json::from_str(r#"{"response": null}"#).unwrap();
        assert_eq!(null.text(), NO_RESPONSE_FALLBACK);

        let blank: AgentReply = serde_json::from_str(r#"{"response": "  "}"#).unwrap();
        assert_eq!(blank.text(), NO_RESPONSE_FALLBACK);
    }

    #[test]
    fn health_status_parses() {
        let health: HealthStatus = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert_eq!(health.status, "ok");
    }
}
