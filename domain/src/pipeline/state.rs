//! Pipeline state machine.
//!
//! The state value is mutated only through [`PipelineStateMachine::transition`],
//! which enforces a fixed table of allowed moves. Every applied move appends a
//! [`TransitionRecord`]; moving to the current state is a no-op.

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the document pipeline for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Analyzing,
    Planning,
    Writing,
    Reviewing,
    UpdatingPreview,
    WaitingFeedback,
    Error,
}

impl PipelineState {
    pub const ALL: [PipelineState; 8] = [
        PipelineState::Idle,
        PipelineState::Analyzing,
        PipelineState::Planning,
        PipelineState::Writing,
        PipelineState::Reviewing,
        PipelineState::UpdatingPreview,
        PipelineState::WaitingFeedback,
        PipelineState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Analyzing => "analyzing",
            PipelineState::Planning => "planning",
            PipelineState::Writing => "writing",
            PipelineState::Reviewing => "reviewing",
            PipelineState::UpdatingPreview => "updating_preview",
            PipelineState::WaitingFeedback => "waiting_feedback",
            PipelineState::Error => "error",
        }
    }

    /// States reachable from `self` in one step.
    pub fn allowed_targets(&self) -> &'static [PipelineState] {
        use PipelineState::*;
        match self {
            Idle => &[Analyzing],
            Analyzing => &[Planning, Writing, Error],
            Planning => &[Writing, Error],
            Writing => &[Reviewing, UpdatingPreview, Error],
            Reviewing => &[Writing, UpdatingPreview, WaitingFeedback, Error],
            UpdatingPreview => &[Idle, WaitingFeedback],
            WaitingFeedback => &[Analyzing, Idle],
            Error => &[Idle, Analyzing],
        }
    }

    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Everything except Idle and WaitingFeedback counts as busy.
    pub fn is_busy(&self) -> bool {
        !matches!(self, PipelineState::Idle | PipelineState::WaitingFeedback)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last action taken by an agent, used by the preview policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    AnalyzeRequest,
    CreatePlan,
    UpdatePlan,
    WriteContent,
    ReviewContent,
    UpdatePreview,
    RequestFeedback,
    HandleError,
}

impl AgentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentAction::AnalyzeRequest => "analyze_request",
            AgentAction::CreatePlan => "create_plan",
            AgentAction::UpdatePlan => "update_plan",
            AgentAction::WriteContent => "write_content",
            AgentAction::ReviewContent => "review_content",
            AgentAction::UpdatePreview => "update_preview",
            AgentAction::RequestFeedback => "request_feedback",
            AgentAction::HandleError => "handle_error",
        }
    }
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit entry for an applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub timestamp: DateTime<Utc>,
    pub from: PipelineState,
    pub to: PipelineState,
    pub actor: String,
    pub reason: String,
    /// Set when the move bypassed the transition table.
    #[serde(default)]
    pub forced: bool,
}

/// Result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// Target equals the current state; nothing recorded.
    Unchanged,
    /// Target is not reachable from the current state; state retained.
    Rejected {
        from: PipelineState,
        to: PipelineState,
    },
}

impl TransitionOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, TransitionOutcome::Rejected { .. })
    }

    /// `Ok(true)` when the state changed, `Ok(false)` for a no-op.
    pub fn into_result(self) -> Result<bool, DomainError> {
        match self {
            TransitionOutcome::Applied => Ok(true),
            TransitionOutcome::Unchanged => Ok(false),
            TransitionOutcome::Rejected { from, to } => {
                Err(DomainError::IllegalTransition { from, to })
            }
        }
    }
}

/// Point-in-time view of the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: PipelineState,
    pub current_agent: Option<String>,
    pub is_busy: bool,
    pub transitions: usize,
    pub last_transition: Option<TransitionRecord>,
}

/// State holder with an append-only transition log.
#[derive(Debug, Clone, Default)]
pub struct PipelineStateMachine {
    state: PipelineState,
    current_agent: Option<String>,
    history: Vec<TransitionRecord>,
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn current_agent(&self) -> Option<&str> {
        self.current_agent.as_deref()
    }

    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        self.state.can_transition_to(target)
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Move to `target` if the table allows it.
    pub fn transition(
        &mut self,
        target: PipelineState,
        actor: &str,
        reason: &str,
    ) -> TransitionOutcome {
        if target == self.state {
            return TransitionOutcome::Unchanged;
        }
        if !self.can_transition_to(target) {
            return TransitionOutcome::Rejected {
                from: self.state,
                to: target,
            };
        }
        self.apply(target, actor, reason, false);
        TransitionOutcome::Applied
    }

    /// Return to Idle at the end of a request regardless of the table.
    pub fn reset_to_idle(&mut self, actor: &str, reason: &str) -> TransitionOutcome {
        self.force(PipelineState::Idle, actor, reason)
    }

    /// Enter Error from any state after an unrecoverable failure.
    pub fn force_error(&mut self, actor: &str, reason: &str) -> TransitionOutcome {
        self.force(PipelineState::Error, actor, reason)
    }

    fn force(&mut self, target: PipelineState, actor: &str, reason: &str) -> TransitionOutcome {
        if target == self.state {
            return TransitionOutcome::Unchanged;
        }
        let forced = !self.can_transition_to(target);
        self.apply(target, actor, reason, forced);
        TransitionOutcome::Applied
    }

    fn apply(&mut self, target: PipelineState, actor: &str, reason: &str, forced: bool) {
        self.history.push(TransitionRecord {
            timestamp: Utc::now(),
            from: self.state,
            to: target,
            actor: actor.to_string(),
            reason: reason.to_string(),
            forced,
        });
        self.state = target;
        self.current_agent = if target == PipelineState::Idle {
            None
        } else {
            Some(actor.to_string())
        };
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            state: self.state,
            current_agent: self.current_agent.clone(),
            is_busy: self.is_busy(),
            transitions: self.history.len(),
            last_transition: self.history.last().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;

    fn table(state: PipelineState) -> Vec<PipelineState> {
        match state {
            Idle => vec![Analyzing],
            Analyzing => vec![Planning, Writing, Error],
            Planning => vec![Writing, Error],
            Writing => vec![Reviewing, UpdatingPreview, Error],
            Reviewing => vec![Writing, UpdatingPreview, WaitingFeedback, Error],
            UpdatingPreview => vec![Idle, WaitingFeedback],
            WaitingFeedback => vec![Analyzing, Idle],
            Error => vec![Idle, Analyzing],
        }
    }

    #[test]
    fn test_can_transition_matches_table_for_all_pairs() {
        for from in PipelineState::ALL {
            for to in PipelineState::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    table(from).contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut sm = PipelineStateMachine::new();
        assert_eq!(sm.transition(Idle, "orchestrator", "noop"), TransitionOutcome::Unchanged);
        assert!(sm.history().is_empty());

        sm.transition(Analyzing, "orchestrator", "start");
        assert_eq!(
            sm.transition(Analyzing, "orchestrator", "again"),
            TransitionOutcome::Unchanged
        );
        assert_eq!(sm.history().len(), 1);
    }

    #[test]
    fn test_illegal_transition_rejected_and_state_kept() {
        let mut sm = PipelineStateMachine::new();
        let outcome = sm.transition(Writing, "writer", "skip ahead");
        assert_eq!(outcome, TransitionOutcome::Rejected { from: Idle, to: Writing });
        assert_eq!(sm.state(), Idle);
        assert!(sm.history().is_empty());
    }

    #[test]
    fn test_outcome_into_result() {
        let mut machine = PipelineStateMachine::new();
        let rejected = machine.transition(PipelineState::Reviewing, "reviewer", "too early");
        let err = rejected.into_result().unwrap_err();
        assert!(matches!(
            err,
            DomainError::IllegalTransition {
                from: PipelineState::Idle,
                to: PipelineState::Reviewing
            }
        ));

        let applied = machine.transition(PipelineState::Analyzing, "orchestrator", "start");
        assert!(applied.into_result().unwrap());
        let unchanged = machine.transition(PipelineState::Analyzing, "orchestrator", "again");
        assert!(!unchanged.into_result().unwrap());
    }

    #[test]
    fn test_transition_records_actor_and_reason() {
        let mut sm = PipelineStateMachine::new();
        sm.transition(Analyzing, "orchestrator", "Analyzing user request");
        sm.transition(Writing, "writer", "Generating content");

        let log = sm.history();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].from, Analyzing);
        assert_eq!(log[1].to, Writing);
        assert_eq!(log[1].actor, "writer");
        assert_eq!(log[1].reason, "Generating content");
        assert!(!log[1].forced);
        assert_eq!(sm.current_agent(), Some("writer"));
    }

    #[test]
    fn test_is_busy() {
        for state in PipelineState::ALL {
            let expected = !matches!(state, Idle | WaitingFeedback);
            assert_eq!(state.is_busy(), expected, "{state}");
        }
    }

    #[test]
    fn test_reset_to_idle_marks_forced_only_off_table() {
        let mut sm = PipelineStateMachine::new();
        sm.transition(Analyzing, "orchestrator", "start");
        sm.reset_to_idle("orchestrator", "conversational reply");
        assert_eq!(sm.state(), Idle);
        assert!(sm.history()[1].forced);
        assert_eq!(sm.current_agent(), None);

        let mut sm = PipelineStateMachine::new();
        sm.transition(Analyzing, "orchestrator", "start");
        sm.transition(Writing, "writer", "write");
        sm.transition(UpdatingPreview, "orchestrator", "preview");
        sm.reset_to_idle("orchestrator", "done");
        assert!(!sm.history().last().unwrap().forced);
    }

    #[test]
    fn test_force_error_from_any_state() {
        let mut sm = PipelineStateMachine::new();
        sm.transition(Analyzing, "orchestrator", "start");
        sm.transition(Writing, "writer", "write");
        sm.transition(UpdatingPreview, "orchestrator", "preview");
        assert!(!sm.can_transition_to(Error));
        assert_eq!(sm.force_error("orchestrator", "boom"), TransitionOutcome::Applied);
        assert_eq!(sm.state(), Error);
        assert!(sm.history().last().unwrap().forced);
        // Error recovers through the table
        assert_eq!(sm.transition(Analyzing, "orchestrator", "retry"), TransitionOutcome::Applied);
    }

    #[test]
    fn test_snapshot() {
        let mut sm = PipelineStateMachine::new();
        sm.transition(Analyzing, "orchestrator", "start");
        let snap = sm.snapshot();
        assert_eq!(snap.state, Analyzing);
        assert!(snap.is_busy);
        assert_eq!(snap.transitions, 1);
        assert_eq!(snap.last_transition.unwrap().to, Analyzing);
    }

    #[test]
    fn test_state_serde_names() {
        assert_eq!(
            serde_json::to_string(&UpdatingPreview).unwrap(),
            "\"updating_preview\""
        );
        assert_eq!(AgentAction::WriteContent.to_string(), "write_content");
    }
}
