//! Orchestration domain
//!
//! - [`context::TaskContext`]: everything one request carries between agents
//! - [`result::OrchestrationResult`]: the caller-facing outcome
//! - [`result::ExecutionSummary`]: what the agents actually did

pub mod context;
pub mod result;
