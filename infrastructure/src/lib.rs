//! Infrastructure layer for docuforge
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: LLM provider clients, configuration file
//! loading, the JSONL conversation logger, file-backed document storage and
//! the in-process push notifier.

pub mod config;
pub mod logging;
pub mod notify;
pub mod persistence;
pub mod providers;

// Re-export commonly used types
pub use config::{ConfigLoadError, ConfigLoader, FileConfig, FileConfigError};
pub use logging::JsonlConversationLogger;
pub use notify::{BroadcastNotifier, SessionEvent};
pub use persistence::JsonFileStore;
pub use providers::{
    ClaudeProvider, GeminiProvider, MockProvider, OpenAiProvider, build_registry,
};
