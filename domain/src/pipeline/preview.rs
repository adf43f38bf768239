//! Preview refresh policy.
//!
//! Rules are evaluated in a fixed order and short-circuit on the first match:
//!
//! | # | Rule | Reason |
//! |---|------|--------|
//! | 1 | caller explicitly asked | `user_requested` |
//! | 2 | state is Idle or WaitingFeedback | `force_state` |
//! | 3 | more than 100 changes and interval elapsed | `content_changes` |
//! | 4 | last action wrote content and interval elapsed | `content_written` |
//! | 5 | last action reviewed content | `review_completed` |

use super::state::{AgentAction, PipelineState};
use std::time::{Duration, Instant};

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewDecision {
    pub update: bool,
    pub reason: &'static str,
}

impl PreviewDecision {
    fn yes(reason: &'static str) -> Self {
        Self {
            update: true,
            reason,
        }
    }

    fn no() -> Self {
        Self {
            update: false,
            reason: "no_trigger",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewPolicy {
    pub min_interval: Duration,
    pub change_threshold: usize,
    pub force_states: Vec<PipelineState>,
}

impl Default for PreviewPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(30),
            change_threshold: 100,
            force_states: vec![PipelineState::Idle, PipelineState::WaitingFeedback],
        }
    }
}

impl PreviewPolicy {
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn decide(
        &self,
        state: PipelineState,
        last_action: AgentAction,
        seconds_since_last_update: f64,
        content_change_count: usize,
        user_requested: bool,
    ) -> PreviewDecision {
        let interval_elapsed = seconds_since_last_update >= self.min_interval.as_secs_f64();

        if user_requested {
            return PreviewDecision::yes("user_requested");
        }
        if self.force_states.contains(&state) {
            return PreviewDecision::yes("force_state");
        }
        if content_change_count > self.change_threshold && interval_elapsed {
            return PreviewDecision::yes("content_changes");
        }
        if last_action == AgentAction::WriteContent && interval_elapsed {
            return PreviewDecision::yes("content_written");
        }
        if last_action == AgentAction::ReviewContent {
            return PreviewDecision::yes("review_completed");
        }
        PreviewDecision::no()
    }

    pub fn should_update(
        &self,
        state: PipelineState,
        last_action: AgentAction,
        seconds_since_last_update: f64,
        content_change_count: usize,
        user_requested: bool,
    ) -> bool {
        self.decide(
            state,
            last_action,
            seconds_since_last_update,
            content_change_count,
            user_requested,
        )
        .update
    }
}

/// Remembers when a preview was last pushed for a session.
#[derive(Debug, Clone, Default)]
pub struct PreviewTracker {
    last_update: Option<Instant>,
}

impl PreviewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the last push, or 0 when nothing has been pushed yet.
    pub fn seconds_since_last_update(&self, now: Instant) -> f64 {
        self.last_update
            .map(|at| now.saturating_duration_since(at).as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn record_update(&mut self, now: Instant) {
        self.last_update = Some(now);
    }

    pub fn has_updated(&self) -> bool {
        self.last_update.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;

    fn policy() -> PreviewPolicy {
        PreviewPolicy::default()
    }

    #[test]
    fn test_large_change_after_interval_updates() {
        assert!(policy().should_update(Writing, AgentAction::AnalyzeRequest, 45.0, 150, false));
    }

    #[test]
    fn test_small_change_without_trigger_does_not_update() {
        assert!(!policy().should_update(Writing, AgentAction::CreatePlan, 45.0, 50, false));
        assert!(!policy().should_update(Reviewing, AgentAction::AnalyzeRequest, 45.0, 50, false));
    }

    #[test]
    fn test_large_change_before_interval_does_not_update() {
        assert!(!policy().should_update(Writing, AgentAction::CreatePlan, 10.0, 500, false));
    }

    #[test]
    fn test_user_request_checked_first() {
        let decision = policy().decide(Idle, AgentAction::ReviewContent, 0.0, 0, true);
        assert_eq!(decision, PreviewDecision::yes("user_requested"));
    }

    #[test]
    fn test_force_states() {
        assert_eq!(
            policy().decide(WaitingFeedback, AgentAction::CreatePlan, 0.0, 0, false).reason,
            "force_state"
        );
        assert!(policy().should_update(Idle, AgentAction::CreatePlan, 0.0, 0, false));
    }

    #[test]
    fn test_write_content_needs_interval() {
        assert!(!policy().should_update(Writing, AgentAction::WriteContent, 29.9, 0, false));
        assert!(policy().should_update(Writing, AgentAction::WriteContent, 30.0, 0, false));
    }

    #[test]
    fn test_review_always_updates() {
        let decision = policy().decide(Reviewing, AgentAction::ReviewContent, 0.0, 0, false);
        assert_eq!(decision.reason, "review_completed");
    }

    #[test]
    fn test_rule_order_content_changes_before_write() {
        let decision = policy().decide(Writing, AgentAction::WriteContent, 60.0, 200, false);
        assert_eq!(decision.reason, "content_changes");
    }

    #[test]
    fn test_custom_interval() {
        let policy = policy().with_min_interval(Duration::from_secs(5));
        assert!(policy.should_update(Writing, AgentAction::WriteContent, 6.0, 0, false));
    }

    #[test]
    fn test_tracker_zero_before_first_update() {
        let mut tracker = PreviewTracker::new();
        let start = Instant::now();
        assert_eq!(tracker.seconds_since_last_update(start), 0.0);
        assert!(!tracker.has_updated());

        tracker.record_update(start);
        let later = start + Duration::from_secs(40);
        assert!((tracker.seconds_since_last_update(later) - 40.0).abs() < 1e-9);
    }
}
