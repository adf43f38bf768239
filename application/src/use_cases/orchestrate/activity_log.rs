//! Per-request activity bookkeeping.
//!
//! Every step boundary produces an [`ActivityRecord`]. Records are
//! dispatched to the registered observers and mirrored to the push
//! notifier, once when they start and again when they finish.

use crate::ports::activity::ActivityHub;
use crate::ports::notifier::{PushEvent, PushNotifier};
use docuforge_domain::{ActivityRecord, SessionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Index of a record within one request's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct StepId(usize);

pub(super) struct ActivityLog {
    session: SessionId,
    hub: Arc<ActivityHub>,
    notifier: Arc<dyn PushNotifier>,
    next_id: Arc<AtomicU64>,
    records: Vec<ActivityRecord>,
}

impl ActivityLog {
    pub(super) fn new(
        session: SessionId,
        hub: Arc<ActivityHub>,
        notifier: Arc<dyn PushNotifier>,
        next_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            session,
            hub,
            notifier,
            next_id,
            records: Vec::new(),
        }
    }

    fn record(&self, agent: &str, action: &str) -> ActivityRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        ActivityRecord::new(id, agent, action)
    }

    /// Open an in-progress record.
    pub(super) async fn start(&mut self, agent: &str, action: &str, input: Option<String>) -> StepId {
        let mut record = self.record(agent, action);
        record.input = input;
        self.push(record).await
    }

    pub(super) async fn complete(&mut self, step: StepId, output: Option<String>) {
        if let Some(record) = self.records.get_mut(step.0) {
            record.complete(output);
            let record = record.clone();
            self.publish(&record).await;
        }
    }

    pub(super) async fn fail(&mut self, step: StepId, error: impl Into<String>) {
        if let Some(record) = self.records.get_mut(step.0) {
            record.fail(error);
            let record = record.clone();
            self.publish(&record).await;
        }
    }

    /// Record a boundary that has no duration of its own.
    pub(super) async fn handoff(&mut self, agent: &str, action: &str, output: impl Into<String>) {
        let mut record = self.record(agent, action);
        record.complete(Some(output.into()));
        self.push(record).await;
    }

    /// Record a failure that was not tied to an open step.
    pub(super) async fn error(&mut self, agent: &str, action: &str, error: impl Into<String>) {
        let mut record = self.record(agent, action);
        record.fail(error);
        self.push(record).await;
    }

    pub(super) fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub(super) fn into_records(self) -> Vec<ActivityRecord> {
        self.records
    }

    async fn push(&mut self, record: ActivityRecord) -> StepId {
        self.publish(&record).await;
        self.records.push(record);
        StepId(self.records.len() - 1)
    }

    async fn publish(&self, record: &ActivityRecord) {
        self.hub.dispatch(record);
        if let Err(e) = self
            .notifier
            .broadcast(&self.session, PushEvent::AgentActivity(record.clone()))
            .await
        {
            debug!(session = %self.session, "Activity push dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::activity::ChannelObserver;
    use crate::testing::RecordingNotifier;
    use docuforge_domain::ActivityStatus;

    fn log_with(hub: Arc<ActivityHub>, notifier: Arc<RecordingNotifier>) -> ActivityLog {
        ActivityLog::new(
            SessionId::new("s"),
            hub,
            notifier,
            Arc::new(AtomicU64::new(0)),
        )
    }

    #[tokio::test]
    async fn test_start_and_complete_notify_twice() {
        let hub = Arc::new(ActivityHub::new());
        let (observer, mut rx) = ChannelObserver::new(8);
        hub.register(Arc::new(observer));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut log = log_with(hub, notifier.clone());

        let step = log.start("writer", "Generating document content", None).await;
        log.complete(step, Some("12 words written".into())).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.status, ActivityStatus::InProgress);
        assert_eq!(second.status, ActivityStatus::Completed);
        assert!(second.end_time.is_some());
        assert_eq!(notifier.kinds(), vec!["agent_activity", "agent_activity"]);
        assert_eq!(log.records().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let hub = Arc::new(ActivityHub::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut log = log_with(hub, notifier);

        log.handoff("orchestrator", "Plan created, handing off to writer", "ready")
            .await;
        let step = log.start("reviewer", "Reviewing content quality", None).await;
        log.fail(step, "Review failed").await;
        log.error("orchestrator", "Processing failed", "boom").await;

        let records = log.into_records();
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(records[0].status, ActivityStatus::Completed);
        assert_eq!(records[1].status, ActivityStatus::Error);
        assert_eq!(records[2].error.as_deref(), Some("boom"));
    }
}
