//! Agent domain module
//!
//! Task roles and the provider/model configuration that binds each role
//! to a backend.

pub mod config;

pub use config::{AgentConfig, ConfigValidationError, ModelAssignment, TaskRole};
