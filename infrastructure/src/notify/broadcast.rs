//! In-process push notifier based on tokio broadcast channels.
//!
//! One channel per session, created on first subscription. Events for a
//! session nobody subscribed to are reported as `NoSubscribers` and dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docuforge_application::{NotifyError, PushEvent, PushNotifier};
use docuforge_domain::SessionId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

/// A pushed event with its delivery timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub event: PushEvent,
    pub timestamp: DateTime<Utc>,
}

pub struct BroadcastNotifier {
    channels: Mutex<HashMap<SessionId, broadcast::Sender<SessionEvent>>>,
    capacity: usize,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<SessionId, broadcast::Sender<SessionEvent>>> {
        match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Receive every event pushed to `session` from now on.
    pub fn subscribe(&self, session: &SessionId) -> broadcast::Receiver<SessionEvent> {
        self.channels()
            .entry(session.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, session: &SessionId) -> usize {
        self.channels()
            .get(session)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl PushNotifier for BroadcastNotifier {
    async fn broadcast(&self, session: &SessionId, event: PushEvent) -> Result<(), NotifyError> {
        let mut channels = self.channels();
        let Some(tx) = channels.get(session) else {
            return Err(NotifyError::NoSubscribers(session.to_string()));
        };

        let event = SessionEvent {
            session_id: session.clone(),
            event,
            timestamp: Utc::now(),
        };
        if tx.send(event).is_err() {
            // Every receiver is gone
            channels.remove(session);
            return Err(NotifyError::NoSubscribers(session.to_string()));
        }
        Ok(())
    }
}
