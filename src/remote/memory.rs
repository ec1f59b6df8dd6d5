//! Long-term memory service client (memorize / retrieve).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{api_key_from_env, check_status, RemoteError};
use crate::config::MemoryConfig;

/// One conversational record sent to the memory service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl MemoryRecord {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            created_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// A user line followed by the assistant's acknowledgement.
    pub fn exchange(user: impl Into<String>, assistant: impl Into<String>) -> Vec<Self> {
        vec![Self::new("user", user), Self::new("assistant", assistant)]
    }
}

/// Items returned from a retrieve call. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub items: Vec<MemoryItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryItem {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MemoryItem {
    pub fn text(&self) -> &str {
        self.content
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or("")
    }
}

impl RetrieveResponse {
    /// Non-empty item texts joined by newlines, or `None` when nothing came back.
    pub fn joined_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .items
            .iter()
            .map(MemoryItem::text)
            .filter(|t| !t.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// The external long-term memory collaborator.
#[async_trait]
pub trait MemoryService: Send + Sync {
    async fn memorize(&self, records: &[MemoryRecord], user_id: &str) -> Result<(), RemoteError>;

    async fn retrieve(&self, query: &str, user_id: &str) -> Result<RetrieveResponse, RemoteError>;
}

/// HTTP client for a memU-compatible memory API.
pub struct MemuClient {
    client: reqwest::Client,
    base_url: String,
    agent_id: String,
    api_key: String,
}

#[derive(Serialize)]
struct MemorizeBody<'a> {
    conversation: &'a [MemoryRecord],
    modality: &'static str,
    user_id: &'a str,
    agent_id: &'a str,
}

#[derive(Serialize)]
struct RetrieveBody<'a> {
    query: &'a str,
    user_id: &'a str,
    agent_id: &'a str,
}

impl MemuClient {
    pub fn new(config: &MemoryConfig, api_key: String) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent_id: config.agent_id.clone(),
            api_key,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/api/v3/memory/{action}", self.base_url)
    }
}

#[async_trait]
impl MemoryService for MemuClient {
    async fn memorize(&self, records: &[MemoryRecord], user_id: &str) -> Result<(), RemoteError> {
        let body = MemorizeBody {
            conversation: records,
            modality: "conversation",
            user_id,
            agent_id: &self.agent_id,
        };
        let response = self
            .client
            .post(self.endpoint("memorize"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn retrieve(&self, query: &str, user_id: &str) -> Result<RetrieveResponse, RemoteError> {
        let body = RetrieveBody {
            query,
            user_id,
            agent_id: &self.agent_id,
        };
        let response = self
            .client
            .post(self.endpoint("retrieve"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let value: serde_json::Value = check_status(response).await?.json().await?;
        if value.is_null() {
            return Ok(RetrieveResponse::default());
        }
        serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Stand-in used when the memory service is turned off.
pub struct DisabledMemory;

#[async_trait]
impl MemoryService for DisabledMemory {
    async fn memorize(&self, _records: &[MemoryRecord], _user_id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::Disabled("memory service"))
    }

    async fn retrieve(&self, _query: &str, _user_id: &str) -> Result<RetrieveResponse, RemoteError> {
        Err(RemoteError::Disabled("memory service"))
    }
}

/// Build the memory collaborator from config. Falls back to [`DisabledMemory`]
/// when disabled, when the API key is missing, or when the client can't be built.
pub fn create_memory_service(config: &MemoryConfig) -> Arc<dyn MemoryService> {
    if !config.enabled {
        return Arc::new(DisabledMemory);
    }
    let Some(api_key) = api_key_from_env(&config.api_key_env) else {
        tracing::warn!(env = %config.api_key_env, "memory service enabled but no API key set");
        return Arc::new(DisabledMemory);
    };
    match MemuClient::new(config, api_key) {
        Ok(client) => {
            tracing::info!(base_url = %config.base_url, "memory service ready");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to build memory client");
            Arc::new(DisabledMemory)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_text_prefers_content() {
        let item: MemoryItem =
            serde_json::from_str(r#"{"content": "likes tea", "text": "ignored"}"#).unwrap();
        assert_eq!(item.text(), "likes tea");
        let item: MemoryItem = serde_json::from_str(r#"{"text": "fallback"}"#).unwrap();
        assert_eq!(item.text(), "fallback");
    }

    #[test]
    fn joined_text_skips_empty_items() {
        let resp: RetrieveResponse = serde_json::from_str(
            r#"{"items": [{"content": "a"}, {}, {"text": "b"}], "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(resp.joined_text().as_deref(), Some("a\nb"));
        assert!(RetrieveResponse::default().joined_text().is_none());
    }

    #[test]
    fn exchange_builds_user_then_assistant() {
        let records = MemoryRecord::exchange("hi", "hello");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role, "user");
        assert_eq!(records[1].role, "assistant");
        assert_eq!(records[0].created_at.len(), 19);
    }

    #[tokio::test]
    async fn disabled_memory_reports_disabled() {
        let err = DisabledMemory.retrieve("q", "u").await.unwrap_err();
        assert!(matches!(err, RemoteError::Disabled(_)));
    }
}
