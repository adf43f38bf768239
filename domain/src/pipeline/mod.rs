//! Pipeline domain
//!
//! - [`state::PipelineStateMachine`]: guarded state transitions with an audit log
//! - [`preview::PreviewPolicy`]: whether accumulated work warrants a preview refresh

pub mod preview;
pub mod state;
