//! LLM provider port
//!
//! Defines the interface for talking to one LLM vendor. The application
//! layer never calls a provider directly: requests go through
//! [`ProviderRouter`](crate::routing::ProviderRouter), which adds timeouts
//! and the fallback pair.

use async_trait::async_trait;
use docuforge_domain::{Message, StreamEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while talking to a provider
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,

    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Per-call knobs passed down to the adapter.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Overrides the configured per-call timeout.
    pub timeout: Option<Duration>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub cancellation: Option<CancellationToken>,
}

impl GenerateOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Handle for receiving streaming events from a provider.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. Dropping the handle closes the
/// channel, which producers treat as a signal to stop.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
    degraded: Arc<AtomicBool>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            receiver,
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True when the text on this stream is a canned apology rather than
    /// provider output.
    ///
    /// Set by the producer before its final event, so it is reliable once
    /// `Completed` has been received.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Shared flag the producer sets with [`mark_degraded`].
    pub(crate) fn degraded_flag(&self) -> Arc<AtomicBool> {
        self.degraded.clone()
    }

    /// A handle that yields `text` once and completes.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let (tx, rx) = mpsc::channel(2);
        // Capacity 2 holds both events without a receiver
        let _ = tx.try_send(StreamEvent::Delta(text.clone()));
        let _ = tx.try_send(StreamEvent::Completed(text));
        Self::new(rx)
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::RequestFailed(e));
                }
            }
        }
        // Channel closed without Completed: return what we have
        Ok(full_text)
    }
}

pub(crate) fn mark_degraded(flag: &AtomicBool) {
    flag.store(true, Ordering::Release);
}

/// One LLM vendor.
///
/// Implementations live in the infrastructure layer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name as used in agent configuration (`"openai"`, `"claude"`, ...)
    fn name(&self) -> &str;

    /// Generate a complete response.
    async fn generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<String, GatewayError>;

    /// Generate a response as a stream of text fragments.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Delta` plus `Completed`, so non-streaming adapters work as is.
    async fn stream_generate(
        &self,
        messages: &[Message],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.generate(messages, model, options).await?;
        Ok(StreamHandle::from_text(result))
    }
}
