//! Offline provider, always registered.

use super::pacing::paced_stream;
use async_trait::async_trait;
use docuforge_application::{GatewayError, GenerateOptions, LlmProvider, StreamHandle};
use docuforge_domain::Message;
use std::time::Duration;

const PREVIEW_CHARS: usize = 50;

/// Echoes the start of the last message back. Needs no credentials.
#[derive(Debug, Default)]
pub struct MockProvider {
    pacing: Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn reply_to(messages: &[Message]) -> String {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("Hello");
        let preview: String = last.chars().take(PREVIEW_CHARS).collect();
        format!("Mock response to: {preview}...")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        messages: &[Message],
        _model: &str,
        _options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        Ok(Self::reply_to(messages))
    }

    async fn stream_generate(
        &self,
        messages: &[Message],
        _model: &str,
        _options: &GenerateOptions,
    ) -> Result<StreamHandle, GatewayError> {
        Ok(paced_stream(Self::reply_to(messages), self.pacing))
    }
}
