//! Per-session agent configuration.
//!
//! [`AgentConfigStore`] holds a process-wide default [`AgentConfig`] plus
//! optional per-session overrides. Values are replaced whole behind an
//! `Arc`, so readers never observe a half-applied update.

use docuforge_domain::{AgentConfig, ConfigValidationError, SessionId};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

#[derive(Default)]
struct Inner {
    default: Arc<AgentConfig>,
    sessions: HashMap<SessionId, Arc<AgentConfig>>,
}

impl Inner {
    fn current(&self, session: Option<&SessionId>) -> Arc<AgentConfig> {
        session
            .and_then(|id| self.sessions.get(id))
            .unwrap_or(&self.default)
            .clone()
    }
}

#[derive(Default)]
pub struct AgentConfigStore {
    inner: RwLock<Inner>,
}

impl AgentConfigStore {
    /// Store with `default` as the process-wide configuration.
    ///
    /// Fails if `default` does not validate.
    pub fn new(default: AgentConfig) -> Result<Self, ConfigValidationError> {
        default.validate()?;
        Ok(Self {
            inner: RwLock::new(Inner {
                default: Arc::new(default),
                sessions: HashMap::new(),
            }),
        })
    }

    /// Configuration in effect for `session` (the default when it has no override).
    pub fn get(&self, session: Option<&SessionId>) -> Arc<AgentConfig> {
        self.read().current(session)
    }

    /// Replace the configuration for `session`, or the default when `None`.
    pub fn set(
        &self,
        session: Option<&SessionId>,
        config: AgentConfig,
    ) -> Result<Arc<AgentConfig>, ConfigValidationError> {
        config.validate()?;
        let config = Arc::new(config);
        let mut inner = self.write();
        match session {
            Some(id) => {
                inner.sessions.insert(id.clone(), config.clone());
            }
            None => inner.default = config.clone(),
        }
        info!(session = ?session.map(SessionId::as_str), "Agent configuration replaced");
        Ok(config)
    }

    /// Apply a partial update on top of the configuration currently in effect.
    ///
    /// Nothing changes unless the merged result validates.
    pub fn update(
        &self,
        session: Option<&SessionId>,
        updates: &Map<String, Value>,
    ) -> Result<Arc<AgentConfig>, ConfigValidationError> {
        // Held across read and write so concurrent updates do not lose fields
        let mut inner = self.write();
        let updated = Arc::new(inner.current(session).with_updates(updates)?);
        match session {
            Some(id) => {
                inner.sessions.insert(id.clone(), updated.clone());
            }
            None => inner.default = updated.clone(),
        }
        info!(
            session = ?session.map(SessionId::as_str),
            fields = updates.len(),
            "Agent configuration updated"
        );
        Ok(updated)
    }

    /// Drop a session override. Returns true if one existed.
    pub fn clear(&self, session: &SessionId) -> bool {
        self.write().sessions.remove(session).is_some()
    }

    pub fn has_override(&self, session: &SessionId) -> bool {
        self.read().sessions.contains_key(session)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
