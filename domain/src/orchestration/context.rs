//! Per-request task context

use crate::document::plan::DocumentPlan;
use crate::session::entities::{ConversationId, Message, SessionId};
use serde_json::{Map, Value};

/// Ephemeral state for one orchestrated request.
///
/// Created at the start of a request and dropped at the end. The plan is
/// copied in from the session and copied back out if an agent changed it.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub session_id: SessionId,
    pub conversation_id: Option<ConversationId>,
    pub user_message: String,
    pub current_plan: Option<DocumentPlan>,
    pub history: Vec<Message>,
    pub metadata: Map<String, Value>,
    /// Text produced by the writer during this request.
    pub generated_content: Option<String>,
}

impl TaskContext {
    pub fn new(session_id: SessionId, user_message: impl Into<String>) -> Self {
        Self {
            session_id,
            conversation_id: None,
            user_message: user_message.into(),
            current_plan: None,
            history: Vec::new(),
            metadata: Map::new(),
            generated_content: None,
        }
    }

    pub fn with_conversation(mut self, conversation_id: Option<ConversationId>) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_plan(mut self, plan: Option<DocumentPlan>) -> Self {
        self.current_plan = plan;
        self
    }

    /// The last `n` history turns, oldest first.
    pub fn recent_history(&self, n: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_history_window() {
        let ctx = TaskContext::new(SessionId::new("s"), "hi").with_history(vec![
            Message::user("1"),
            Message::assistant("2"),
            Message::user("3"),
            Message::assistant("4"),
        ]);
        let recent: Vec<&str> = ctx.recent_history(3).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(recent, vec!["2", "3", "4"]);
        assert_eq!(ctx.recent_history(10).len(), 4);
    }
}
