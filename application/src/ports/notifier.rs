//! Push notification port
//!
//! Live updates for clients watching a session: streamed content while the
//! writer works, the saved document once it is persisted, and activity
//! records. Delivery is fire-and-forget.

use crate::ports::persistence::StoredDocument;
use async_trait::async_trait;
use docuforge_domain::{ActivityRecord, SessionId};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("No subscribers for session {0}")]
    NoSubscribers(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Event pushed to session subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    DocumentStreamingStart {
        user_request: String,
    },
    DocumentContentStreaming {
        chunk: String,
        full_content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        section_name: Option<String>,
        is_header: bool,
        word_count: usize,
    },
    DocumentContentComplete {
        final_content: String,
        word_count: usize,
    },
    DocumentUpdated {
        document: StoredDocument,
        sections_count: usize,
        word_count: usize,
    },
    AgentActivity(ActivityRecord),
}

impl PushEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PushEvent::DocumentStreamingStart { .. } => "document_streaming_start",
            PushEvent::DocumentContentStreaming { .. } => "document_content_streaming",
            PushEvent::DocumentContentComplete { .. } => "document_content_complete",
            PushEvent::DocumentUpdated { .. } => "document_updated",
            PushEvent::AgentActivity(_) => "agent_activity",
        }
    }
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn broadcast(&self, session: &SessionId, event: PushEvent) -> Result<(), NotifyError>;
}

/// Notifier that drops everything
pub struct NoPushNotifier;

#[async_trait]
impl PushNotifier for NoPushNotifier {
    async fn broadcast(&self, _session: &SessionId, _event: PushEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
