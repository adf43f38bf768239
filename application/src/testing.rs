//! Hand-written doubles shared by the application tests.

use crate::ports::notifier::{NotifyError, PushEvent, PushNotifier};
use crate::ports::persistence::{DocumentStore, PersistenceError, StoredDocument};
use crate::ports::provider::{GatewayError, GenerateOptions, LlmProvider};
use crate::routing::{ProviderRegistry, ProviderRouter};
use async_trait::async_trait;
use chrono::Utc;
use docuforge_domain::{AgentConfig, Message, SessionId, StructuredContent};
use std::sync::{Arc, Mutex};

/// Answers with a fixed reply per call, cycling through `replies`.
///
/// Records every prompt it receives.
pub struct ScriptedProvider {
    name: &'static str,
    replies: Vec<String>,
    pub prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            replies: replies.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// System prompts of every call, in order.
    pub fn system_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|messages| {
                messages
                    .first()
                    .map(|m| m.content.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        messages: &[Message],
        _model: &str,
        _options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        let mut prompts = self.prompts.lock().unwrap();
        let index = prompts.len();
        prompts.push(messages.to_vec());
        if self.replies.is_empty() {
            return Ok(String::new());
        }
        Ok(self.replies[index % self.replies.len()].clone())
    }
}

pub struct FailingProvider(pub &'static str);

#[async_trait]
impl LlmProvider for FailingProvider {
    fn name(&self) -> &str {
        self.0
    }

    async fn generate(
        &self,
        _messages: &[Message],
        _model: &str,
        _options: &GenerateOptions,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::ConnectionError("unreachable".into()))
    }
}

/// Router where every role uses `provider` and the fallback is mock.
pub fn router_with(provider: Arc<dyn LlmProvider>) -> ProviderRouter {
    let name = provider.name().to_string();
    let registry = ProviderRegistry::new().with(provider);
    ProviderRouter::new(
        Arc::new(registry),
        Arc::new(AgentConfig::uniform(&name, "test-model")),
    )
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<PushEvent>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(PushEvent::kind).collect()
    }
}

#[async_trait]
impl PushNotifier for RecordingNotifier {
    async fn broadcast(&self, _session: &SessionId, event: PushEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub saved: Mutex<Vec<StructuredContent>>,
    pub fail: bool,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save_content(
        &self,
        session: &SessionId,
        content: &StructuredContent,
    ) -> Result<StoredDocument, PersistenceError> {
        if self.fail {
            return Err(PersistenceError::Storage("disk full".into()));
        }
        self.saved.lock().unwrap().push(content.clone());
        let now = Utc::now();
        Ok(StoredDocument {
            id: session.to_string(),
            title: content.title.clone(),
            document_type: content.document_type.clone(),
            status: "draft".to_string(),
            content: content.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}
