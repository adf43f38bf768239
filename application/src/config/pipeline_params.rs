//! Pipeline parameters: orchestration loop control.
//!
//! [`PipelineParams`] groups the static knobs of
//! [`DocumentOrchestrator`](crate::use_cases::orchestrate::DocumentOrchestrator).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Minimum gap between preview pushes triggered by writing.
    pub preview_min_interval: Duration,
    /// History turns included in direct-writing prompts.
    pub history_window: usize,
    /// Pause before answering a conversational request.
    pub conversational_delay: Duration,
    /// Pause between words when replaying a response through `stream_response`.
    pub response_word_delay: Duration,
    /// Timeout applied to every provider call; `None` uses the agent config.
    pub call_timeout: Option<Duration>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            preview_min_interval: Duration::from_secs(30),
            history_window: 3,
            conversational_delay: Duration::ZERO,
            response_word_delay: Duration::ZERO,
            call_timeout: None,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_preview_min_interval(mut self, interval: Duration) -> Self {
        self.preview_min_interval = interval;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn with_conversational_delay(mut self, delay: Duration) -> Self {
        self.conversational_delay = delay;
        self
    }

    pub fn with_response_word_delay(mut self, delay: Duration) -> Self {
        self.response_word_delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }
}
