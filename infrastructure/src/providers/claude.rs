//! Anthropic Messages API adapter.
//!
//! Streaming is word by word over a complete response.

use super::pacing::paced_stream;
use super::{http_error, status_error};
use crate::config::FileClaudeConfig;
use async_trait::async_trait;
use docuforge_application::{GatewayError, GenerateOptions, LlmProvider, StreamHandle};
use docuforge_domain::{Message, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: String,
    max_tokens: u32,
    pacing: Duration,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ClaudeProvider {
    pub fn new(client: Client, api_key: String, config: &FileClaudeConfig, pacing: Duration) -> Self {
        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            max_tokens: config.max_tokens,
            pacing,
        }
    }

    pub fn from_config(
        client: Client,
        config: &FileClaudeConfig,
        pacing: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GatewayError::MissingCredential(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(client, api_key, config, pacing))
    }

    /// System prompts move to the top-level `system` field. When several are
    /// present the last one wins.
    fn request<'a>(
        &self,
        messages: &'a [Message],
        model: &'a str,
        options: &GenerateOptions,
    ) -> MessagesRequest<'a> {
        let mut system = None;
        let mut turns = Vec::with_capacity(messages.len());
        for message in messages {
            match message.role {
                Role::System => system = Some(message.content.as_str()),
                role => turns.push(ClaudeMessage {
                    role: role.as_str(),
                    content: &message.content,
                }),
            }
        }
        MessagesRequest {
            model,
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            messages: turns,
            system,
            temperature: options.temperature,
        }
    }
}

/// Text of the first text block.
fn first_text(response: MessagesResponse) -> Result<String, GatewayError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .ok_or_else(|| GatewayError::InvalidResponse("No text in Claude response".to_string()))
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    async fn generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        debug!(model, messages = messages.len(), "Claude request");
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.request(messages, model, options))
            .send()
            .await
            .map_err(|e| http_error("Claude", e))?;

        if !response.status().is_success() {
            return Err(status_error("Claude", response).await);
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let content = first_text(body)?;
        debug!(chars = content.len(), "Claude response");
        Ok(content)
    }

    async fn stream_generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let text = self.generate(messages, model, options).await?;
        Ok(paced_stream(text, self.pacing))
    }
}
