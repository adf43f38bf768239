//! Application layer for docuforge
//!
//! This crate contains the provider router, the task agents, per-session
//! runtime state and the orchestration use case, together with the ports
//! they are wired through. It depends only on the domain layer.

pub mod agents;
pub mod config;
pub mod ports;
pub mod routing;
pub mod session;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use agents::{PlannerAgent, ReviewerAgent, WriteOutcome, WriterAgent};
pub use config::{AgentConfigStore, PipelineParams};
pub use ports::{
    activity::{ActivityHub, ActivityObserver, ChannelObserver, ObserverError, ObserverHandle},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    notifier::{NoPushNotifier, NotifyError, PushEvent, PushNotifier},
    persistence::{DocumentStore, PersistenceError, StoredDocument},
    provider::{GatewayError, GenerateOptions, LlmProvider, StreamHandle},
};
pub use routing::{ProviderRegistry, ProviderRouter, RouteOrigin, RoutedResponse};
pub use session::{SessionContext, SessionRegistry};
pub use use_cases::orchestrate::{
    DocumentOrchestrator, OrchestrationError, OrchestrationRequest, OrchestratorState,
};
