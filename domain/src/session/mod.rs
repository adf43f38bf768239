//! Conversation domain.
//!
//! - [`entities::Message`]: a single {role, content} turn sent to a provider
//! - [`entities::SessionId`]: key for per-session state and configuration
//! - [`stream::StreamEvent`]: incremental output of a streaming generation
//! - [`history::truncate_history`]: context budget trimming for prior turns

pub mod entities;
pub mod history;
pub mod stream;
