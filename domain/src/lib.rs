//! Domain layer for docuforge
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Pipeline
//!
//! A request flows through a fixed set of states (analyze, plan, write,
//! review, preview) guarded by [`PipelineStateMachine`]. Whether a preview
//! refresh is pushed is decided by [`PreviewPolicy`].
//!
//! ## Agents
//!
//! Each task role (orchestrator, planner, writer, reviewer) is bound to a
//! provider/model pair through [`AgentConfig`]. The parsing helpers in
//! [`document`], [`review`] and [`analysis`] turn free-form model output
//! into structured values and never fail: they degrade to heuristics and
//! then to fixed defaults.

pub mod activity;
pub mod agent;
pub mod analysis;
pub mod config;
pub mod core;
pub mod document;
pub mod orchestration;
pub mod pipeline;
pub mod prompt;
pub mod review;
pub mod session;

// Re-export commonly used types
pub use activity::{
    ActivityRecord, ActivityStatus, AgentMessage, AgentMessageQueue, AgentMessageType,
};
pub use agent::config::{
    AgentConfig, ConfigValidationError, KNOWN_PROVIDERS, MIN_TIMEOUT_SECONDS, ModelAssignment,
    TaskRole,
};
pub use config::OutputFormat;
pub use analysis::intent::{Intent, RequestAnalysis, classify_request, parse_analysis};
pub use core::error::DomainError;
pub use document::{
    content::{ContentSection, StructuredContent, structure_content, word_count},
    plan::{DocumentPlan, PlanProgress, PlanSection, SectionPriority},
    plan_parser::{
        PlanSource, basic_plan, parse_plan_json, parse_plan_response, parse_plan_text,
        request_fallback_plan,
    },
};
pub use orchestration::{
    context::TaskContext,
    result::{ExecutionSummary, OrchestrationResult},
};
pub use pipeline::{
    preview::{PreviewDecision, PreviewPolicy, PreviewTracker},
    state::{
        AgentAction, PipelineState, PipelineStateMachine, StateSnapshot, TransitionOutcome,
        TransitionRecord,
    },
};
pub use prompt::DocumentPromptTemplate;
pub use review::{
    entities::{CompletenessAssessment, GrammarCheck, REVISION_THRESHOLD, ReviewResult},
    parsing::{extract_review_score, parse_review_text},
};
pub use session::{
    entities::{ConversationId, Message, Role, SessionId, last_message_content},
    history::truncate_history,
    stream::StreamEvent,
};
