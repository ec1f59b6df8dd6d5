//! Chat model collaborator.
//!
//! Only reached when the intent classifier finds no local action. The session
//! passes the non-excluded catalog and the exclusion list so the model is told
//! to honor exclusions too; its reply is returned as opaque text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{api_key_from_env, check_status, RemoteError};
use crate::catalog::types::Source;
use crate::config::ChatConfig;

const SYSTEM_PROMPT: &str = "You are a travel planning assistant. Help the traveler plan and adjust \
their trip. For short questions such as \"I have an hour free, where should I go?\", suggest two or \
three of the registered sources briefly, name the source each suggestion comes from as \
[source: NAME], and give a rough duration. Reply in the traveler's language.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One line of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the chat collaborator receives for one call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    pub preferences: Option<String>,
    pub sources: Vec<Source>,
    pub excluded_categories: Vec<String>,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String, RemoteError>;
}

/// Build the system prompt: exclusions first as a hard rule, then sources,
/// then remembered preferences.
pub fn build_system_prompt(request: &ChatRequest) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();

    if !request.excluded_categories.is_empty() {
        prompt.push_str(&format!(
            "\n\n[Forgotten categories - never suggest]\nThe traveler explicitly forgot these \
             categories. Do not suggest any place that belongs to them, however well known. This \
             rule overrides every other rule.\nForgotten categories: {}",
            request.excluded_categories.join(", ")
        ));
    }

    if !request.sources.is_empty() {
        prompt.push_str(&format!(
            "\n\n[Registered sources - {}]",
            request.sources.len()
        ));
        for s in &request.sources {
            let duration = s
                .declared_duration()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".into());
            let anchor = s.anchor_id.as_deref().unwrap_or("?");
            prompt.push_str(&format!(
                "\n- {} (ID: {}, category: {}, duration: {duration}min, anchor: {anchor}",
                s.name, s.id, s.category
            ));
            if !s.memo.is_empty() {
                prompt.push_str(&format!(", memo: {}", s.memo));
            }
            prompt.push(')');
        }
    }

    if let Some(prefs) = &request.preferences {
        prompt.push_str(&format!("\n\n[Known preferences]\n{prefs}"));
    }

    prompt
}

/// Messages API client.
pub struct AnthropicChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicChat {
    pub fn new(config: &ChatConfig, api_key: String) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }
}

#[async_trait]
impl ChatService for AnthropicChat {
    async fn chat(&self, request: &ChatRequest) -> Result<String, RemoteError> {
        let body = MessagesBody {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: build_system_prompt(request),
            messages: &request.messages,
        };

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            sources = request.sources.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        let parsed: MessagesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        Ok(parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .unwrap_or_default())
    }
}

/// Stand-in used when no chat model is configured.
pub struct OfflineChat;

#[async_trait]
impl ChatService for OfflineChat {
    async fn chat(&self, _request: &ChatRequest) -> Result<String, RemoteError> {
        Err(RemoteError::Disabled("chat model"))
    }
}

/// Build the chat collaborator from config, falling back to [`OfflineChat`].
pub fn create_chat_service(config: &ChatConfig) -> Arc<dyn ChatService> {
    if !config.enabled {
        return Arc::new(OfflineChat);
    }
    let Some(api_key) = api_key_from_env(&config.api_key_env) else {
        tracing::warn!(env = %config.api_key_env, "chat enabled but no API key set");
        return Arc::new(OfflineChat);
    };
    match AnthropicChat::new(config, api_key) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build chat client");
            Arc::new(OfflineChat)
        }
    }
}
