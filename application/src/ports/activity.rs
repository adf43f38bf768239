//! Activity observer port
//!
//! Observers receive every [`ActivityRecord`] as a request moves through
//! the pipeline: once when a step starts and again when it finishes. The
//! [`ActivityHub`] owns the registrations and isolates observers from each
//! other: a failing or panicking observer is logged and skipped.

use docuforge_domain::ActivityRecord;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("Observer rejected record: {0}")]
    Rejected(String),

    #[error("Observer channel is full")]
    Full,

    #[error("Observer channel is closed")]
    Closed,
}

/// Receives activity records.
///
/// Called synchronously from the pipeline, so implementations must not
/// block.
pub trait ActivityObserver: Send + Sync {
    fn on_activity(&self, record: &ActivityRecord) -> Result<(), ObserverError>;
}

/// Handle returned by [`ActivityHub::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

/// Registry of activity observers.
#[derive(Default)]
pub struct ActivityHub {
    observers: RwLock<Vec<(ObserverHandle, Arc<dyn ActivityObserver>)>>,
    next_id: AtomicU64,
}

impl ActivityHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn ActivityObserver>) -> ObserverHandle {
        let handle = ObserverHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut observers = match self.observers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        observers.push((handle, observer));
        handle
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unregister(&self, handle: ObserverHandle) -> bool {
        let mut observers = match self.observers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = observers.len();
        observers.retain(|(h, _)| *h != handle);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `record` to every observer. Returns how many failed.
    pub fn dispatch(&self, record: &ActivityRecord) -> usize {
        // Observers run without the lock held so they may unregister themselves
        let observers = self.snapshot();
        let mut failures = 0;
        for (handle, observer) in observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_activity(record))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    warn!(observer = handle.0, activity = %record.action, "Observer failed: {}", e);
                }
                Err(_) => {
                    failures += 1;
                    warn!(observer = handle.0, activity = %record.action, "Observer panicked");
                }
            }
        }
        failures
    }

    fn snapshot(&self) -> Vec<(ObserverHandle, Arc<dyn ActivityObserver>)> {
        match self.observers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Observer that forwards records into a bounded channel.
///
/// Uses `try_send`: a slow consumer loses records instead of stalling the
/// pipeline.
pub struct ChannelObserver {
    sender: mpsc::Sender<ActivityRecord>,
}

impl ChannelObserver {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ActivityRecord>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl ActivityObserver for ChannelObserver {
    fn on_activity(&self, record: &ActivityRecord) -> Result<(), ObserverError> {
        self.sender.try_send(record.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ObserverError::Full,
            mpsc::error::TrySendError::Closed(_) => ObserverError::Closed,
        })
    }
}

/// Observer backed by a closure.
pub struct FnObserver<F>(pub F);

impl<F> ActivityObserver for FnObserver<F>
where
    F: Fn(&ActivityRecord) + Send + Sync,
{
    fn on_activity(&self, record: &ActivityRecord) -> Result<(), ObserverError> {
        (self.0)(record);
        Ok(())
    }
}
