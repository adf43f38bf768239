//! Prompt domain
//!
//! Message builders for every model call the agents make.

mod document;

pub use document::DocumentPromptTemplate;
