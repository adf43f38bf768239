//! Type definitions for the orchestration use case.

use docuforge_domain::{
    AgentConfig, ConversationId, Message, PlanProgress, SessionId, StateSnapshot,
};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that abort a request.
///
/// Provider, parse and persistence failures never reach this type: they are
/// absorbed by the router and agents.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Agent panicked: {0}")]
    Panicked(String),
}

impl OrchestrationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestrationError::Cancelled)
    }
}

/// Input for `process_user_request`.
#[derive(Debug, Clone)]
pub struct OrchestrationRequest {
    pub message: String,
    pub session_id: SessionId,
    pub conversation_id: Option<ConversationId>,
    /// Prior turns, already truncated by the caller.
    pub history: Vec<Message>,
    pub cancellation: Option<CancellationToken>,
}

impl OrchestrationRequest {
    pub fn new(session_id: SessionId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
            conversation_id: None,
            history: Vec::new(),
            cancellation: None,
        }
    }

    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Introspection view returned by `current_state`.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorState {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub snapshot: StateSnapshot,
    pub pending_messages: usize,
    pub plan_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_progress: Option<PlanProgress>,
    pub config: AgentConfig,
    pub available_providers: Vec<String>,
}
