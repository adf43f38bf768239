//! Activity records and agent messages.
//!
//! [`ActivityRecord`]s describe step-level progress of one request and are
//! pushed to observers as they start and finish. [`AgentMessage`]s are
//! notifications queued for the caller and drained after each request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    InProgress,
    Completed,
    Error,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Error => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, ActivityStatus::InProgress)
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a request as seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: u64,
    pub agent: String,
    pub action: String,
    pub status: ActivityStatus,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ActivityRecord {
    pub fn new(id: u64, agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id,
            agent: agent.into(),
            action: action.into(),
            status: ActivityStatus::InProgress,
            start_time: Utc::now(),
            end_time: None,
            input: None,
            output: None,
            error: None,
            metadata: Map::new(),
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Set a new status; finished states stamp the end time.
    pub fn set_status(&mut self, status: ActivityStatus) {
        self.status = status;
        if status.is_finished() {
            self.end_time = Some(Utc::now());
        }
    }

    pub fn complete(&mut self, output: Option<String>) {
        if output.is_some() {
            self.output = output;
        }
        self.set_status(ActivityStatus::Completed);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.set_status(ActivityStatus::Error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMessageType {
    PlanCreated,
    ContentGenerated,
    ContentReviewed,
    PreviewUpdated,
}

impl AgentMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMessageType::PlanCreated => "plan_created",
            AgentMessageType::ContentGenerated => "content_generated",
            AgentMessageType::ContentReviewed => "content_reviewed",
            AgentMessageType::PreviewUpdated => "preview_updated",
        }
    }
}

/// Notification queued for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub agent_type: String,
    pub message_type: AgentMessageType,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub fn new(
        agent_type: impl Into<String>,
        message_type: AgentMessageType,
        content: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            agent_type: agent_type.into(),
            message_type,
            content: content.into(),
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// FIFO outbox of agent messages.
#[derive(Debug, Clone, Default)]
pub struct AgentMessageQueue {
    messages: Vec<AgentMessage>,
}

impl AgentMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: AgentMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn peek(&self) -> &[AgentMessage] {
        &self.messages
    }

    /// Remove and return everything queued so far.
    pub fn drain(&mut self) -> Vec<AgentMessage> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_lifecycle() {
        let mut record = ActivityRecord::new(1, "writer", "Generating document content")
            .with_input("write a memo");
        assert_eq!(record.status, ActivityStatus::InProgress);
        assert!(record.end_time.is_none());

        record.complete(Some("120 words".to_string()));
        assert_eq!(record.status, ActivityStatus::Completed);
        assert!(record.end_time.is_some());
        assert_eq!(record.output.as_deref(), Some("120 words"));
    }

    #[test]
    fn test_activity_failure() {
        let mut record = ActivityRecord::new(2, "orchestrator", "Processing failed");
        record.fail("boom");
        assert_eq!(record.status, ActivityStatus::Error);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.end_time.is_some());
    }

    #[test]
    fn test_activity_serialized_keys() {
        let record = ActivityRecord::new(3, "planner", "Creating document plan")
            .with_metadata("sections", 4);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("startTime").is_some());
        assert!(value.get("endTime").is_none());
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["metadata"]["sections"], 4);
    }

    #[test]
    fn test_queue_drain_clears() {
        let mut queue = AgentMessageQueue::new();
        queue.push(AgentMessage::new(
            "planner",
            AgentMessageType::PlanCreated,
            "Created plan with 3 sections",
            json!({"sections": 3}),
        ));
        queue.push(AgentMessage::new(
            "writer",
            AgentMessageType::ContentGenerated,
            "Generated 200 words",
            Value::Null,
        ));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message_type, AgentMessageType::PlanCreated);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
