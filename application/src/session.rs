//! Per-session runtime state.
//!
//! A [`SessionContext`] owns everything that outlives a single request: the
//! pipeline state machine, the preview tracker, the current plan and the
//! queue of agent messages. Requests for the same session are serialized by
//! [`SessionContext::begin_request`].

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use docuforge_domain::{
    AgentMessage, AgentMessageQueue, DocumentPlan, PipelineState, PipelineStateMachine,
    PreviewTracker, SessionId, StateSnapshot, TransitionOutcome, TransitionRecord,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct SessionContext {
    id: SessionId,
    machine: Mutex<PipelineStateMachine>,
    preview: Mutex<PreviewTracker>,
    plan: Mutex<Option<DocumentPlan>>,
    outbox: Mutex<AgentMessageQueue>,
    request_gate: tokio::sync::Mutex<()>,
    logger: Arc<dyn ConversationLogger>,
}

impl SessionContext {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            machine: Mutex::new(PipelineStateMachine::new()),
            preview: Mutex::new(PreviewTracker::new()),
            plan: Mutex::new(None),
            outbox: Mutex::new(AgentMessageQueue::new()),
            request_gate: tokio::sync::Mutex::new(()),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Wait until no other request is running for this session.
    ///
    /// The returned guard must be held for the whole request.
    pub async fn begin_request(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.request_gate.lock().await
    }

    // ==================== Pipeline State ====================

    pub fn state(&self) -> PipelineState {
        lock(&self.machine).state()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        lock(&self.machine).snapshot()
    }

    pub fn transitions(&self) -> Vec<TransitionRecord> {
        lock(&self.machine).history().to_vec()
    }

    /// Request a transition. Rejections are logged and leave the state as is.
    pub fn transition(&self, target: PipelineState, actor: &str, reason: &str) -> TransitionOutcome {
        self.apply(actor, |machine| machine.transition(target, actor, reason))
    }

    pub fn reset_to_idle(&self, actor: &str, reason: &str) -> TransitionOutcome {
        self.apply(actor, |machine| machine.reset_to_idle(actor, reason))
    }

    pub fn force_error(&self, actor: &str, reason: &str) -> TransitionOutcome {
        self.apply(actor, |machine| machine.force_error(actor, reason))
    }

    fn apply(
        &self,
        actor: &str,
        change: impl FnOnce(&mut PipelineStateMachine) -> TransitionOutcome,
    ) -> TransitionOutcome {
        let mut machine = lock(&self.machine);
        let outcome = change(&mut machine);
        let record = match outcome {
            TransitionOutcome::Applied => machine.history().last().cloned(),
            _ => None,
        };
        drop(machine);

        if let Err(e) = outcome.into_result() {
            warn!(session = %self.id, actor, "Rejected: {}", e);
        }
        if let Some(record) = record {
            debug!(
                session = %self.id,
                forced = record.forced,
                "State {} -> {} by {}: {}",
                record.from,
                record.to,
                record.actor,
                record.reason
            );
            self.logger.log(ConversationEvent::new(
                "pipeline_transition",
                json!({
                    "session_id": self.id.as_str(),
                    "from": record.from.as_str(),
                    "to": record.to.as_str(),
                    "actor": record.actor,
                    "reason": record.reason,
                    "forced": record.forced,
                }),
            ));
        }
        outcome
    }

    // ==================== Preview ====================

    pub fn seconds_since_preview(&self, now: Instant) -> f64 {
        lock(&self.preview).seconds_since_last_update(now)
    }

    pub fn record_preview(&self, now: Instant) {
        lock(&self.preview).record_update(now);
    }

    // ==================== Plan ====================

    pub fn plan(&self) -> Option<DocumentPlan> {
        lock(&self.plan).clone()
    }

    pub fn set_plan(&self, plan: Option<DocumentPlan>) {
        *lock(&self.plan) = plan;
    }

    // ==================== Agent Messages ====================

    pub fn push_message(&self, message: AgentMessage) {
        lock(&self.outbox).push(message);
    }

    pub fn pending_messages(&self) -> usize {
        lock(&self.outbox).len()
    }

    pub fn drain_messages(&self) -> Vec<AgentMessage> {
        lock(&self.outbox).drain()
    }
}

/// Live sessions keyed by id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<SessionContext>>>,
    logger: Option<Arc<dyn ConversationLogger>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionContext>> {
        lock(&self.sessions).get(id).cloned()
    }

    pub fn get_or_create(&self, id: &SessionId) -> Arc<SessionContext> {
        lock(&self.sessions)
            .entry(id.clone())
            .or_insert_with(|| {
                let context = SessionContext::new(id.clone());
                let context = match &self.logger {
                    Some(logger) => context.with_logger(logger.clone()),
                    None => context,
                };
                Arc::new(context)
            })
            .clone()
    }

    /// Drop a session's state. Returns true if it existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        lock(&self.sessions).remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
