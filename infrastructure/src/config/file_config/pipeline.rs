//! Pipeline configuration from TOML (`[pipeline]` section)

use docuforge_application::PipelineParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Minimum seconds between time-gated preview refreshes.
    pub preview_min_interval_secs: u64,
    /// Delay between words when a provider without native streaming is
    /// streamed word by word. 0 delivers immediately.
    pub stream_pacing_ms: u64,
    /// Conversation turns given to the writer for context.
    pub history_window: usize,
    /// Pause before a conversational reply.
    pub conversational_delay_ms: u64,
    /// Delay between words of a streamed final reply.
    pub response_word_delay_ms: u64,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            preview_min_interval_secs: 30,
            stream_pacing_ms: 0,
            history_window: 3,
            conversational_delay_ms: 0,
            response_word_delay_ms: 0,
        }
    }
}

impl FilePipelineConfig {
    pub fn stream_pacing(&self) -> Duration {
        Duration::from_millis(self.stream_pacing_ms)
    }

    pub fn to_params(&self) -> PipelineParams {
        PipelineParams::default()
            .with_preview_min_interval(Duration::from_secs(self.preview_min_interval_secs))
            .with_history_window(self.history_window)
            .with_conversational_delay(Duration::from_millis(self.conversational_delay_ms))
            .with_response_word_delay(Duration::from_millis(self.response_word_delay_ms))
    }
}
