//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod activity;
pub mod conversation_logger;
pub mod notifier;
pub mod persistence;
pub mod provider;
