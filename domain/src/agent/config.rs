//! Agent configuration: which provider and model serve each task role.
//!
//! [`AgentConfig`] is an immutable value. Changes go through
//! [`AgentConfig::with_updates`], which produces a new validated value so
//! readers never observe a half-applied update.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Provider names accepted in configuration.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "claude", "google", "mock"];

/// Lower bound for `timeout_seconds`.
pub const MIN_TIMEOUT_SECONDS: u64 = 5;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("unknown provider '{provider}' for {role}")]
    UnknownProvider { role: String, provider: String },

    #[error("max_retries must be at least 1 (got {0})")]
    InvalidMaxRetries(u32),

    #[error("timeout_seconds must be at least {minimum} (got {seconds})")]
    TimeoutTooShort { seconds: u64, minimum: u64 },

    #[error("unknown configuration field '{0}'")]
    UnknownField(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Task category served by a configured provider/model pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskRole {
    Orchestrator,
    Planner,
    Writer,
    Reviewer,
}

impl TaskRole {
    pub const ALL: [TaskRole; 4] = [
        TaskRole::Orchestrator,
        TaskRole::Planner,
        TaskRole::Writer,
        TaskRole::Reviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskRole::Orchestrator => "orchestrator",
            TaskRole::Planner => "planner",
            TaskRole::Writer => "writer",
            TaskRole::Reviewer => "reviewer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskRole::Orchestrator => "Orchestrator",
            TaskRole::Planner => "Planner",
            TaskRole::Writer => "Writer",
            TaskRole::Reviewer => "Reviewer",
        }
    }
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "orchestrator" => Ok(TaskRole::Orchestrator),
            "planner" => Ok(TaskRole::Planner),
            "writer" => Ok(TaskRole::Writer),
            "reviewer" => Ok(TaskRole::Reviewer),
            other => Err(format!("unknown task role: {other}")),
        }
    }
}

/// A resolved (provider, model) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAssignment {
    pub provider: String,
    pub model: String,
}

impl ModelAssignment {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Per-role provider/model mapping plus the single fallback pair.
///
/// The serialized form is flat so it can be exchanged as a JSON object and
/// embedded as the `[agents]` TOML table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub orchestrator_llm: String,
    pub orchestrator_model: String,
    pub planner_llm: String,
    pub planner_model: String,
    pub writer_llm: String,
    pub writer_model: String,
    pub reviewer_llm: String,
    pub reviewer_model: String,
    pub fallback_llm: String,
    pub fallback_model: String,
    pub max_retries: u32,
    pub timeout_seconds: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            orchestrator_llm: "google".to_string(),
            orchestrator_model: "gemini-2.5-pro".to_string(),
            planner_llm: "google".to_string(),
            planner_model: "gemini-2.5-pro".to_string(),
            writer_llm: "google".to_string(),
            writer_model: "gemini-2.5-pro".to_string(),
            reviewer_llm: "google".to_string(),
            reviewer_model: "gemini-2.5-pro".to_string(),
            fallback_llm: "mock".to_string(),
            fallback_model: "mock".to_string(),
            max_retries: 3,
            timeout_seconds: 30,
        }
    }
}

impl AgentConfig {
    /// Every role bound to the same provider/model, default fallback.
    pub fn uniform(provider: &str, model: &str) -> Self {
        Self {
            orchestrator_llm: provider.to_string(),
            orchestrator_model: model.to_string(),
            planner_llm: provider.to_string(),
            planner_model: model.to_string(),
            writer_llm: provider.to_string(),
            writer_model: model.to_string(),
            reviewer_llm: provider.to_string(),
            reviewer_model: model.to_string(),
            ..Default::default()
        }
    }

    /// Provider/model pair for a task role.
    pub fn assignment_for(&self, role: TaskRole) -> ModelAssignment {
        let (provider, model) = match role {
            TaskRole::Orchestrator => (&self.orchestrator_llm, &self.orchestrator_model),
            TaskRole::Planner => (&self.planner_llm, &self.planner_model),
            TaskRole::Writer => (&self.writer_llm, &self.writer_model),
            TaskRole::Reviewer => (&self.reviewer_llm, &self.reviewer_model),
        };
        ModelAssignment::new(provider.clone(), model.clone())
    }

    /// Provider/model pair for a role given by name.
    ///
    /// Unrecognised names resolve to the fallback pair.
    pub fn assignment_for_name(&self, role: &str) -> ModelAssignment {
        match role.parse::<TaskRole>() {
            Ok(role) => self.assignment_for(role),
            Err(_) => self.fallback(),
        }
    }

    pub fn fallback(&self) -> ModelAssignment {
        ModelAssignment::new(self.fallback_llm.clone(), self.fallback_model.clone())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }

    /// Check provider names and numeric bounds.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let providers = [
            ("orchestrator", &self.orchestrator_llm),
            ("planner", &self.planner_llm),
            ("writer", &self.writer_llm),
            ("reviewer", &self.reviewer_llm),
            ("fallback", &self.fallback_llm),
        ];
        for (role, provider) in providers {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigValidationError::UnknownProvider {
                    role: role.to_string(),
                    provider: provider.clone(),
                });
            }
        }

        let models = [
            ("orchestrator_model", &self.orchestrator_model),
            ("planner_model", &self.planner_model),
            ("writer_model", &self.writer_model),
            ("reviewer_model", &self.reviewer_model),
            ("fallback_model", &self.fallback_model),
        ];
        for (field, model) in models {
            if model.trim().is_empty() {
                return Err(ConfigValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: "model name cannot be empty".to_string(),
                });
            }
        }

        if self.max_retries < 1 {
            return Err(ConfigValidationError::InvalidMaxRetries(self.max_retries));
        }
        if self.timeout_seconds < MIN_TIMEOUT_SECONDS {
            return Err(ConfigValidationError::TimeoutTooShort {
                seconds: self.timeout_seconds,
                minimum: MIN_TIMEOUT_SECONDS,
            });
        }
        Ok(())
    }

    /// Apply a partial update and return the new, validated configuration.
    ///
    /// `self` is left untouched; on any error nothing is applied.
    pub fn with_updates(&self, updates: &Map<String, Value>) -> Result<Self, ConfigValidationError> {
        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(ConfigValidationError::InvalidValue {
                    field: "*".to_string(),
                    reason: "configuration is not an object".to_string(),
                });
            }
        };

        for (key, value) in updates {
            if !current.contains_key(key) {
                return Err(ConfigValidationError::UnknownField(key.clone()));
            }
            current.insert(key.clone(), value.clone());
        }

        let updated: AgentConfig = serde_json::from_value(Value::Object(current)).map_err(|e| {
            ConfigValidationError::InvalidValue {
                field: updates.keys().cloned().collect::<Vec<_>>().join(","),
                reason: e.to_string(),
            }
        })?;
        updated.validate()?;
        Ok(updated)
    }

    /// Exchange form as a JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
