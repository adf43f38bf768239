//! Application-level configuration.
//!
//! - [`PipelineParams`]: orchestration loop control (preview interval, pacing, history)
//! - [`AgentConfigStore`]: default and per-session [`AgentConfig`](docuforge_domain::AgentConfig)

pub mod agent_config_store;
pub mod pipeline_params;

pub use agent_config_store::AgentConfigStore;
pub use pipeline_params::PipelineParams;
