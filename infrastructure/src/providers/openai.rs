//! OpenAI Chat Completions adapter with native SSE streaming.

use super::sse::SseLineBuffer;
use super::{http_error, status_error};
use crate::config::FileOpenAiConfig;
use async_trait::async_trait;
use docuforge_application::{GatewayError, GenerateOptions, LlmProvider, StreamHandle};
use docuforge_domain::{Message, StreamEvent};
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl OpenAiProvider {
    pub fn new(client: Client, api_key: String, config: &FileOpenAiConfig) -> Self {
        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Build the adapter if an API key can be resolved.
    pub fn from_config(client: Client, config: &FileOpenAiConfig) -> Result<Self, GatewayError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GatewayError::MissingCredential(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(client, api_key, config))
    }

    fn request<'a>(
        &self,
        messages: &'a [Message],
        model: &'a str,
        options: &GenerateOptions,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature.unwrap_or(self.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            stream,
        }
    }

    async fn post(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| http_error("OpenAI", e))?;

        if !response.status().is_success() {
            return Err(status_error("OpenAI", response).await);
        }
        Ok(response)
    }
}

/// `choices[0].message.content` of a completion body.
fn completion_text(body: &Value) -> Result<String, GatewayError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GatewayError::InvalidResponse("No content in OpenAI response".to_string()))
}

enum ChunkEvent {
    Text(String),
    Done,
    Skip,
}

/// Interpret one SSE payload of a streamed completion.
fn parse_chunk(payload: &str) -> Result<ChunkEvent, GatewayError> {
    if payload == "[DONE]" {
        return Ok(ChunkEvent::Done);
    }
    let json: Value = serde_json::from_str(payload)
        .map_err(|e| GatewayError::InvalidResponse(format!("Bad stream chunk: {e}")))?;
    if let Some(message) = json["error"]["message"].as_str() {
        return Err(GatewayError::RequestFailed(message.to_string()));
    }
    match json["choices"][0]["delta"]["content"].as_str() {
        Some(text) if !text.is_empty() => Ok(ChunkEvent::Text(text.to_string())),
        _ => Ok(ChunkEvent::Skip),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        debug!(model, messages = messages.len(), "OpenAI request");
        let response = self.post(&self.request(messages, model, options, false)).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let content = completion_text(&body)?;
        debug!(chars = content.len(), "OpenAI response");
        Ok(content)
    }

    async fn stream_generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<StreamHandle, GatewayError> {
        debug!(model, messages = messages.len(), "OpenAI stream request");
        let response = self.post(&self.request(messages, model, options, true)).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = SseLineBuffer::new();
            let mut full = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                for payload in buffer.push(&chunk) {
                    match parse_chunk(&payload) {
                        Ok(ChunkEvent::Text(text)) => {
                            full.push_str(&text);
                            if tx.send(StreamEvent::Delta(text)).await.is_err() {
                                return;
                            }
                        }
                        Ok(ChunkEvent::Done) => {
                            let _ = tx.send(StreamEvent::Completed(full)).await;
                            return;
                        }
                        Ok(ChunkEvent::Skip) => {}
                        Err(e) => {
                            let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                            return;
                        }
                    }
                }
            }
            let _ = tx.send(StreamEvent::Completed(full)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}
