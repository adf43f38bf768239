//! Task agents
//!
//! Each agent wraps the [`ProviderRouter`](crate::routing::ProviderRouter)
//! with its own prompts and a response parser that degrades instead of
//! failing.

pub mod planner;
pub mod reviewer;
pub mod writer;

pub use planner::PlannerAgent;
pub use reviewer::ReviewerAgent;
pub use writer::{WriteOutcome, WriterAgent};
