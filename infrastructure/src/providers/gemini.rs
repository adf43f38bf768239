//! Google Gemini adapter over the Generative Language REST API.
//!
//! Streaming is word by word over a complete response.

use super::pacing::paced_stream;
use super::{http_error, status_error};
use crate::config::FileGoogleConfig;
use async_trait::async_trait;
use docuforge_application::{GatewayError, GenerateOptions, LlmProvider, StreamHandle};
use docuforge_domain::{Message, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    pacing: Duration,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

// ============================================================================
// Provider
// ============================================================================

impl GeminiProvider {
    pub fn new(client: Client, api_key: String, config: &FileGoogleConfig, pacing: Duration) -> Self {
        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            pacing,
        }
    }

    pub fn from_config(
        client: Client,
        config: &FileGoogleConfig,
        pacing: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GatewayError::MissingCredential(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(client, api_key, config, pacing))
    }

    /// System messages are joined into `systemInstruction`; assistant turns
    /// use Gemini's `model` role.
    fn request(&self, messages: &[Message], options: &GenerateOptions) -> GenerateContentRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();
        for message in messages {
            let role = match message.role {
                Role::System => {
                    system_parts.push(Part {
                        text: message.content.clone(),
                    });
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            });
        }

        // generateContent rejects a request without any user turn
        if contents.is_empty() {
            contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: "Please provide a helpful response.".to_string(),
                }],
            });
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then_some(Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature.unwrap_or(self.temperature),
                max_output_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            },
        }
    }
}

/// Concatenated text parts of the first candidate.
fn candidate_text(response: GenerateContentResponse) -> Result<String, GatewayError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(GatewayError::InvalidResponse(
            "No text in Gemini response".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        debug!(model, messages = messages.len(), "Gemini request");
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request(messages, options))
            .send()
            .await
            .map_err(|e| http_error("Gemini", e))?;

        if !response.status().is_success() {
            return Err(status_error("Gemini", response).await);
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let content = candidate_text(body)?;
        debug!(chars = content.len(), "Gemini response");
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            Client::new(),
            "key".to_string(),
            &FileGoogleConfig::default(),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_request_maps_roles() {
        let messages = vec![
            Message::system("You write documents."),
            Message::user("Draft a memo"),
            Message::assistant("Here it is"),
        ];
        let body = serde_json::to_value(provider().request(&messages, &GenerateOptions::default()))
            .unwrap();
        assert_eq!(
            body["systemInstruction"],
            json!({"parts": [{"text": "You write documents."}]})
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2000);
    }

    #[test]
    fn test_system_only_prompt_gets_user_turn() {
        let messages = vec![Message::system("context")];
        let request = provider().request(&messages, &GenerateOptions::default());
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn test_candidate_text() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "world"}]}
            }]
        }))
        .unwrap();
        assert_eq!(candidate_text(body).unwrap(), "Hello world");

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert!(candidate_text(blocked).is_err());
    }
}
