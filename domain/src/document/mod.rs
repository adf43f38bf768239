//! Document domain
//!
//! - [`plan::DocumentPlan`]: ordered sections with a step cursor
//! - [`plan_parser`]: tiered extraction of plans from model output
//! - [`content::StructuredContent`]: section list handed to persistence

pub mod content;
pub mod plan;
pub mod plan_parser;
