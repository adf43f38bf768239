//! Domain error types

use crate::agent::config::ConfigValidationError;
use crate::pipeline::state::PipelineState;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    #[error("Illegal pipeline transition: {from} -> {to}")]
    IllegalTransition { from: PipelineState, to: PipelineState },
}

impl DomainError {
    /// The underlying validation failure, if this is a config error.
    pub fn as_config_error(&self) -> Option<&ConfigValidationError> {
        match self {
            DomainError::InvalidConfig(e) => Some(e),
            DomainError::IllegalTransition { .. } => None,
        }
    }
}
