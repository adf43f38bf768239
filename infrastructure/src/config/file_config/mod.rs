//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod output;
mod pipeline;
mod providers;

pub use output::{FileLoggingConfig, FileOutputConfig, FileStorageConfig};
pub use pipeline::FilePipelineConfig;
pub use providers::{FileClaudeConfig, FileGoogleConfig, FileOpenAiConfig, FileProvidersConfig};

use docuforge_domain::{AgentConfig, ConfigValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic errors found after a config file parsed successfully.
#[derive(Debug, Error)]
pub enum FileConfigError {
    #[error("[agents] {0}")]
    Agents(#[from] ConfigValidationError),

    #[error("[pipeline] {0}")]
    InvalidPipeline(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Default provider/model per agent role
    pub agents: AgentConfig,
    /// Provider credentials and endpoints
    pub providers: FileProvidersConfig,
    /// Orchestration loop tuning
    pub pipeline: FilePipelineConfig,
    /// Conversation transcript and diagnostic log locations
    pub logging: FileLoggingConfig,
    /// Where generated documents are written
    pub storage: FileStorageConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the whole configuration. Stops at the first problem.
    pub fn validate(&self) -> Result<(), FileConfigError> {
        self.agents.validate()?;
        if self.pipeline.history_window == 0 {
            return Err(FileConfigError::InvalidPipeline(
                "history_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docuforge_domain::OutputFormat;

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agents.fallback_llm, "mock");
        assert_eq!(config.pipeline.preview_min_interval_secs, 30);
    }

    #[test]
    fn test_full_config_deserialize() {
        let toml_str = r#"
[agents]
orchestrator_llm = "openai"
orchestrator_model = "gpt-4o"
writer_llm = "claude"
writer_model = "claude-sonnet-4"
max_retries = 2

[providers.openai]
api_key_env = "MY_OPENAI_KEY"

[pipeline]
history_window = 5
stream_pacing_ms = 50

[logging]
conversation_log = "logs/conversation.jsonl"

[storage]
documents_dir = "/tmp/docs"

[output]
format = "json"
color = false
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.orchestrator_llm, "openai");
        assert_eq!(config.agents.writer_model, "claude-sonnet-4");
        assert_eq!(config.agents.planner_llm, "google");
        assert_eq!(config.agents.max_retries, 2);
        assert_eq!(config.providers.openai.api_key_env, "MY_OPENAI_KEY");
        assert_eq!(config.providers.openai.max_tokens, 2000);
        assert_eq!(config.pipeline.history_window, 5);
        assert_eq!(config.pipeline.stream_pacing_ms, 50);
        assert_eq!(
            config.logging.conversation_log.as_deref(),
            Some(std::path::Path::new("logs/conversation.jsonl"))
        );
        assert_eq!(config.storage.documents_dir.to_str(), Some("/tmp/docs"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let toml_str = r#"
[agents]
reviewer_llm = "cohere"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(FileConfigError::Agents(ConfigValidationError::UnknownProvider { .. }))
        ));
    }

    #[test]
    fn test_zero_history_window_rejected() {
        let mut config = FileConfig::default();
        config.pipeline.history_window = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("history_window"));
    }
}
