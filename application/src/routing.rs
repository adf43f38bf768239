//! Provider routing with timeout and fallback.
//!
//! [`ProviderRouter`] resolves the provider/model pair for a task role from
//! the session's [`AgentConfig`], calls the adapter with a bounded wait, and
//! on any failure tries the fallback pair exactly once. When the fallback is
//! the mock provider a canned apology is synthesized instead. If everything
//! fails a generic apology is returned: routing never surfaces an error.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::provider::{
    GatewayError, GenerateOptions, LlmProvider, StreamHandle, mark_degraded,
};
use docuforge_domain::{
    AgentConfig, Message, ModelAssignment, StreamEvent, TaskRole, last_message_content,
};
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Provider name of the deterministic test double.
pub const MOCK_PROVIDER: &str = "mock";

/// Returned when both the primary and the fallback attempt failed.
pub const FINAL_APOLOGY: &str = "I apologize, but I'm currently unable to process your request due to AI service issues. Please try again later.";

/// Streamed when neither the primary nor the fallback provider is registered.
pub const NO_PROVIDERS_MESSAGE: &str = "Error: No available LLM providers";

/// Apology used in place of calling the mock provider as a fallback.
pub fn mock_apology(last_message: &str) -> String {
    let request = if last_message.is_empty() {
        "unknown request"
    } else {
        last_message
    };
    format!(
        "I apologize, but I'm currently experiencing issues connecting to the AI service. \
         Your request '{request}' has been received, but I cannot generate the full content right now. \
         Please try again in a few moments. The system will continue to save any generated content."
    )
}

/// Registered adapters keyed by provider name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn with(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn LlmProvider>> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOrigin {
    Primary,
    Fallback,
    /// Synthesized apology; no provider produced this text.
    Apology,
}

impl RouteOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteOrigin::Primary => "primary",
            RouteOrigin::Fallback => "fallback",
            RouteOrigin::Apology => "apology",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub origin: RouteOrigin,
}

impl RoutedResponse {
    /// True when no provider answered and the text is a canned apology.
    pub fn is_degraded(&self) -> bool {
        self.origin == RouteOrigin::Apology
    }
}

enum StreamFailure {
    ReceiverGone,
    Gateway(GatewayError),
}

impl From<GatewayError> for StreamFailure {
    fn from(e: GatewayError) -> Self {
        StreamFailure::Gateway(e)
    }
}

/// Routes task-role requests to providers.
///
/// Cheap to clone: the registry, config and logger are shared.
#[derive(Clone)]
pub struct ProviderRouter {
    registry: Arc<ProviderRegistry>,
    config: Arc<AgentConfig>,
    logger: Arc<dyn ConversationLogger>,
}

impl ProviderRouter {
    pub fn new(registry: Arc<ProviderRegistry>, config: Arc<AgentConfig>) -> Self {
        Self {
            registry,
            config,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Same providers, different role assignments.
    pub fn with_config(&self, config: Arc<AgentConfig>) -> Self {
        Self {
            registry: self.registry.clone(),
            config,
            logger: self.logger.clone(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn available_providers(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn is_provider_available(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Route a request and return only the text.
    pub async fn route(
        &self,
        role: TaskRole,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> String {
        self.route_detailed(role, messages, options).await.text
    }

    pub async fn route_detailed(
        &self,
        role: TaskRole,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> RoutedResponse {
        let primary = self.config.assignment_for(role);
        self.dispatch(role.as_str(), primary, messages, options).await
    }

    /// Route by role name; unrecognised names use the fallback pair directly.
    pub async fn route_named(
        &self,
        role: &str,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> RoutedResponse {
        let primary = self.config.assignment_for_name(role);
        self.dispatch(role, primary, messages, options).await
    }

    async fn dispatch(
        &self,
        label: &str,
        primary: ModelAssignment,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> RoutedResponse {
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        info!(role = label, "Routing to {}", primary);
        self.logger.log(ConversationEvent::new(
            "llm_request",
            json!({
                "role": label,
                "provider": primary.provider,
                "model": primary.model,
                "messages": messages.len(),
            }),
        ));

        let started = Instant::now();
        match self.call(&primary, messages, options, timeout).await {
            Ok(text) => {
                return self.finish(label, primary, text, RouteOrigin::Primary, started);
            }
            Err(GatewayError::Cancelled) => {
                debug!(role = label, "Request cancelled");
                return self.apology(label, primary, FINAL_APOLOGY.to_string(), "cancelled");
            }
            Err(e) => {
                error!(role = label, "Error with {}: {}", primary, e);
                self.logger.log(ConversationEvent::new(
                    "llm_fallback",
                    json!({
                        "role": label,
                        "provider": primary.provider,
                        "model": primary.model,
                        "error": e.to_string(),
                    }),
                ));
            }
        }

        let fallback = self.config.fallback();
        if !self.registry.contains(&fallback.provider) {
            error!(role = label, "Fallback provider {} not available", fallback.provider);
            return self.apology(label, fallback, FINAL_APOLOGY.to_string(), "no fallback");
        }

        warn!(role = label, "Falling back to {}", fallback);
        if fallback.provider == MOCK_PROVIDER {
            let text = mock_apology(last_message_content(messages));
            return self.apology(label, fallback, text, "mock fallback");
        }

        let started = Instant::now();
        match self.call(&fallback, messages, options, timeout).await {
            Ok(text) => self.finish(label, fallback, text, RouteOrigin::Fallback, started),
            Err(e) => {
                error!(role = label, "Fallback {} also failed: {}", fallback, e);
                self.apology(label, fallback, FINAL_APOLOGY.to_string(), &e.to_string())
            }
        }
    }

    async fn call(
        &self,
        assignment: &ModelAssignment,
        messages: &[Message],
        options: &GenerateOptions,
        timeout: Duration,
    ) -> Result<String, GatewayError> {
        let provider = self
            .registry
            .get(&assignment.provider)
            .ok_or_else(|| GatewayError::ProviderUnavailable(assignment.provider.clone()))?;
        guarded(
            options,
            timeout,
            provider.generate(messages, &assignment.model, options),
        )
        .await?
    }

    fn finish(
        &self,
        label: &str,
        assignment: ModelAssignment,
        text: String,
        origin: RouteOrigin,
        started: Instant,
    ) -> RoutedResponse {
        info!(
            role = label,
            "Got response from {} ({} chars)",
            assignment,
            text.len()
        );
        self.logger.log(ConversationEvent::new(
            "llm_response",
            json!({
                "role": label,
                "provider": assignment.provider,
                "model": assignment.model,
                "origin": origin.as_str(),
                "chars": text.len(),
                "duration_ms": started.elapsed().as_millis() as u64,
            }),
        ));
        RoutedResponse {
            text,
            provider: assignment.provider,
            model: assignment.model,
            origin,
        }
    }

    fn apology(
        &self,
        label: &str,
        assignment: ModelAssignment,
        text: String,
        reason: &str,
    ) -> RoutedResponse {
        self.logger.log(ConversationEvent::new(
            "llm_failure",
            json!({ "role": label, "reason": reason }),
        ));
        RoutedResponse {
            text,
            provider: assignment.provider,
            model: assignment.model,
            origin: RouteOrigin::Apology,
        }
    }

    // ==================== Streaming ====================

    /// Route a streaming request.
    ///
    /// Fragments arrive on the returned handle. If the primary stream fails
    /// part way, the fallback restarts generation from scratch on the same
    /// handle. When no provider answers, the handle carries a canned apology
    /// and reports [`StreamHandle::is_degraded`]. Must be called from within
    /// a Tokio runtime.
    pub fn stream_route(
        &self,
        role: TaskRole,
        messages: Vec<Message>,
        options: GenerateOptions,
    ) -> StreamHandle {
        let (tx, rx) = mpsc::channel(64);
        let router = self.clone();
        let primary = self.config.assignment_for(role);
        let handle = StreamHandle::new(rx);
        let degraded = handle.degraded_flag();
        tokio::spawn(async move {
            router
                .pump_stream(role.as_str(), primary, messages, options, tx, degraded)
                .await;
        });
        handle
    }

    async fn pump_stream(
        self,
        label: &str,
        primary: ModelAssignment,
        messages: Vec<Message>,
        options: GenerateOptions,
        tx: mpsc::Sender<StreamEvent>,
        degraded: Arc<AtomicBool>,
    ) {
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let primary_registered = self.registry.contains(&primary.provider);

        let mut full = String::new();
        match self
            .forward_stream(&primary, &messages, &options, timeout, &tx, &mut full)
            .await
        {
            Ok(()) => {
                let _ = tx.send(StreamEvent::Completed(full)).await;
                return;
            }
            Err(StreamFailure::ReceiverGone) => return,
            Err(StreamFailure::Gateway(GatewayError::Cancelled)) => {
                let _ = tx
                    .send(StreamEvent::Error(GatewayError::Cancelled.to_string()))
                    .await;
                return;
            }
            Err(StreamFailure::Gateway(e)) => {
                error!(role = label, "Streaming error with {}: {}", primary, e);
                self.logger.log(ConversationEvent::new(
                    "llm_fallback",
                    json!({
                        "role": label,
                        "provider": primary.provider,
                        "model": primary.model,
                        "error": e.to_string(),
                        "streaming": true,
                    }),
                ));
            }
        }

        let fallback = self.config.fallback();
        if !self.registry.contains(&fallback.provider) {
            let text = if primary_registered {
                FINAL_APOLOGY
            } else {
                NO_PROVIDERS_MESSAGE
            };
            mark_degraded(&degraded);
            send_whole(&tx, text.to_string()).await;
            return;
        }

        warn!(role = label, "Falling back to {} for streaming", fallback);
        if fallback.provider == MOCK_PROVIDER {
            mark_degraded(&degraded);
            send_whole(&tx, mock_apology(last_message_content(&messages))).await;
            return;
        }

        let mut full = String::new();
        match self
            .forward_stream(&fallback, &messages, &options, timeout, &tx, &mut full)
            .await
        {
            Ok(()) => {
                let _ = tx.send(StreamEvent::Completed(full)).await;
            }
            Err(StreamFailure::ReceiverGone) => {}
            Err(StreamFailure::Gateway(e)) => {
                error!(role = label, "Fallback stream {} also failed: {}", fallback, e);
                mark_degraded(&degraded);
                send_whole(&tx, FINAL_APOLOGY.to_string()).await;
            }
        }
    }

    async fn forward_stream(
        &self,
        assignment: &ModelAssignment,
        messages: &[Message],
        options: &GenerateOptions,
        timeout: Duration,
        tx: &mpsc::Sender<StreamEvent>,
        full: &mut String,
    ) -> Result<(), StreamFailure> {
        let provider = self
            .registry
            .get(&assignment.provider)
            .ok_or_else(|| GatewayError::ProviderUnavailable(assignment.provider.clone()))?;
        let mut handle = guarded(
            options,
            timeout,
            provider.stream_generate(messages, &assignment.model, options),
        )
        .await??;

        // The timeout bounds the wait for each fragment, not the whole stream
        loop {
            match guarded(options, timeout, handle.next_event()).await? {
                None => return Ok(()),
                Some(StreamEvent::Delta(chunk)) => {
                    full.push_str(&chunk);
                    if tx.send(StreamEvent::Delta(chunk)).await.is_err() {
                        return Err(StreamFailure::ReceiverGone);
                    }
                }
                Some(StreamEvent::Completed(text)) => {
                    if full.is_empty() && !text.is_empty() {
                        full.push_str(&text);
                        if tx.send(StreamEvent::Delta(text)).await.is_err() {
                            return Err(StreamFailure::ReceiverGone);
                        }
                    }
                    return Ok(());
                }
                Some(StreamEvent::Error(e)) => {
                    return Err(GatewayError::RequestFailed(e).into());
                }
            }
        }
    }
}

/// Run `fut` with a timeout, aborting early if the call is cancelled.
async fn guarded<F: Future>(
    options: &GenerateOptions,
    timeout: Duration,
    fut: F,
) -> Result<F::Output, GatewayError> {
    let timed = tokio::time::timeout(timeout, fut);
    match &options.cancellation {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(GatewayError::Cancelled),
            result = timed => result.map_err(|_| GatewayError::Timeout(timeout)),
        },
        None => timed.await.map_err(|_| GatewayError::Timeout(timeout)),
    }
}

async fn send_whole(tx: &mpsc::Sender<StreamEvent>, text: String) {
    if tx.send(StreamEvent::Delta(text.clone())).await.is_ok() {
        let _ = tx.send(StreamEvent::Completed(text)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    // -- Test providers --------------------------------------------------

    struct StaticProvider {
        name: &'static str,
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(name: &'static str, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(
            &self,
            _messages: &[Message],
            _model: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    struct FailingProvider(&'static str);

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
            Err(GatewayError::ConnectionError("connection refused".into()))
        }
    }

    struct SlowProvider(&'static str);

    #[async_trait]
    impl LlmProvider for SlowProvider {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(
            &self,
            _messages: &[Message],
            _model: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok("too late".into())
        }
    }

    /// Streams `chunks`, then errors if `fail` is set.
    struct ChunkProvider {
        name: &'static str,
        chunks: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for ChunkProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(
            &self,
            _messages: &[Message],
            _model: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GatewayError> {
            Ok(self.chunks.concat())
        }

        async fn stream_generate(
            &self,
            _messages: &[Message],
            _model: &str,
            _options: &GenerateOptions,
        ) -> Result<StreamHandle, GatewayError> {
            let (tx, rx) = mpsc::channel(16);
            for chunk in &self.chunks {
                tx.send(StreamEvent::Delta(chunk.to_string())).await.unwrap();
            }
            if self.fail {
                tx.send(StreamEvent::Error("stream reset".into())).await.unwrap();
            } else {
                tx.send(StreamEvent::Completed(self.chunks.concat()))
                    .await
                    .unwrap();
            }
            Ok(StreamHandle::new(rx))
        }
    }

    fn config(primary: &str, fallback: &str) -> Arc<AgentConfig> {
        Arc::new(AgentConfig {
            fallback_llm: fallback.to_string(),
            fallback_model: format!("{fallback}-model"),
            ..AgentConfig::uniform(primary, &format!("{primary}-model"))
        })
    }

    fn router(registry: ProviderRegistry, config: Arc<AgentConfig>) -> ProviderRouter {
        ProviderRouter::new(Arc::new(registry), config)
    }

    fn request() -> Vec<Message> {
        vec![Message::system("sys"), Message::user("draft a memo")]
    }

    // ==================== route ====================

    #[tokio::test]
    async fn test_primary_success() {
        let openai = StaticProvider::new("openai", "primary text");
        let router = router(ProviderRegistry::new().with(openai.clone()), config("openai", "mock"));

        let response = router
            .route_detailed(TaskRole::Writer, &request(), &GenerateOptions::default())
            .await;

        assert_eq!(response.text, "primary text");
        assert_eq!(response.origin, RouteOrigin::Primary);
        assert_eq!(response.model, "openai-model");
        assert_eq!(openai.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_uses_real_fallback_once() {
        let claude = StaticProvider::new("claude", "fallback text");
        let router = router(
            ProviderRegistry::new().with(Arc::new(FailingProvider("openai"))).with(claude.clone()),
            config("openai", "claude"),
        );

        let response = router
            .route_detailed(TaskRole::Planner, &request(), &GenerateOptions::default())
            .await;

        assert_eq!(response.text, "fallback text");
        assert_eq!(response.origin, RouteOrigin::Fallback);
        assert_eq!(claude.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mock_fallback_is_synthesized() {
        let mock = StaticProvider::new("mock", "should not be called");
        let router = router(
            ProviderRegistry::new().with(Arc::new(FailingProvider("openai"))).with(mock.clone()),
            config("openai", "mock"),
        );

        let response = router
            .route_detailed(TaskRole::Writer, &request(), &GenerateOptions::default())
            .await;

        assert!(response.is_degraded());
        assert!(response.text.contains("'draft a memo'"));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unregistered_primary_triggers_fallback() {
        let claude = StaticProvider::new("claude", "from claude");
        let router = router(ProviderRegistry::new().with(claude), config("google", "claude"));

        let text = router
            .route(TaskRole::Reviewer, &request(), &GenerateOptions::default())
            .await;

        assert_eq!(text, "from claude");
    }

    #[tokio::test]
    async fn test_everything_failing_returns_final_apology() {
        let router = router(
            ProviderRegistry::new()
                .with(Arc::new(FailingProvider("openai")))
                .with(Arc::new(FailingProvider("claude"))),
            config("openai", "claude"),
        );

        for role in TaskRole::ALL {
            let response = router
                .route_detailed(role, &request(), &GenerateOptions::default())
                .await;
            assert_eq!(response.text, FINAL_APOLOGY);
            assert!(response.is_degraded());
        }
    }

    #[tokio::test]
    async fn test_no_providers_at_all_still_answers() {
        let router = router(ProviderRegistry::new(), config("openai", "claude"));
        let text = router
            .route(TaskRole::Orchestrator, &request(), &GenerateOptions::default())
            .await;
        assert!(!text.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let claude = StaticProvider::new("claude", "in time");
        let router = router(
            ProviderRegistry::new().with(Arc::new(SlowProvider("openai"))).with(claude),
            config("openai", "claude"),
        );

        let options = GenerateOptions::default().with_timeout(Duration::from_secs(5));
        let response = router
            .route_detailed(TaskRole::Writer, &request(), &options)
            .await;

        assert_eq!(response.text, "in time");
        assert_eq!(response.origin, RouteOrigin::Fallback);
    }

    #[tokio::test]
    async fn test_unknown_role_uses_fallback_pair_directly() {
        let mock = StaticProvider::new("mock", "mocked");
        let router = router(ProviderRegistry::new().with(mock.clone()), config("openai", "mock"));

        let response = router
            .route_named("summarizer", &request(), &GenerateOptions::default())
            .await;

        assert_eq!(response.text, "mocked");
        assert_eq!(response.origin, RouteOrigin::Primary);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_skips_fallback() {
        let claude = StaticProvider::new("claude", "fallback");
        let router = router(
            ProviderRegistry::new().with(Arc::new(SlowProvider("openai"))).with(claude.clone()),
            config("openai", "claude"),
        );
        let token = CancellationToken::new();
        token.cancel();

        let response = router
            .route_detailed(
                TaskRole::Writer,
                &request(),
                &GenerateOptions::default().with_cancellation(token),
            )
            .await;

        assert!(response.is_degraded());
        assert_eq!(claude.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_available_providers_sorted() {
        let router = router(
            ProviderRegistry::new()
                .with(StaticProvider::new("openai", ""))
                .with(StaticProvider::new("claude", ""))
                .with(StaticProvider::new("mock", "")),
            config("openai", "mock"),
        );
        assert_eq!(router.available_providers(), vec!["claude", "mock", "openai"]);
        assert!(router.is_provider_available("claude"));
        assert!(!router.is_provider_available("google"));
    }

    // ==================== stream_route ====================

    #[tokio::test]
    async fn test_stream_primary_success() {
        let router = router(
            ProviderRegistry::new().with(Arc::new(ChunkProvider {
                name: "openai",
                chunks: vec!["Hello ", "world"],
                fail: false,
            })),
            config("openai", "mock"),
        );

        let mut handle =
            router.stream_route(TaskRole::Writer, request(), GenerateOptions::default());
        let mut completed = None;
        while let Some(event) = handle.next_event().await {
            if let StreamEvent::Completed(text) = event {
                completed = Some(text);
            }
        }
        assert_eq!(completed.as_deref(), Some("Hello world"));
        assert!(!handle.is_degraded());
    }

    #[tokio::test]
    async fn test_stream_restarts_on_fallback() {
        let router = router(
            ProviderRegistry::new()
                .with(Arc::new(ChunkProvider {
                    name: "openai",
                    chunks: vec!["partial "],
                    fail: true,
                }))
                .with(Arc::new(ChunkProvider {
                    name: "claude",
                    chunks: vec!["complete ", "answer"],
                    fail: false,
                })),
            config("openai", "claude"),
        );

        let mut handle =
            router.stream_route(TaskRole::Writer, request(), GenerateOptions::default());
        let mut deltas = Vec::new();
        let mut completed = None;
        while let Some(event) = handle.next_event().await {
            match event {
                StreamEvent::Delta(d) => deltas.push(d),
                StreamEvent::Completed(text) => completed = Some(text),
                StreamEvent::Error(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(deltas, vec!["partial ", "complete ", "answer"]);
        assert_eq!(completed.as_deref(), Some("complete answer"));
        assert!(!handle.is_degraded());
    }

    #[tokio::test]
    async fn test_stream_mock_fallback_apologizes() {
        let router = router(
            ProviderRegistry::new()
                .with(Arc::new(FailingProvider("openai")))
                .with(StaticProvider::new("mock", "unused")),
            config("openai", "mock"),
        );

        let mut handle =
            router.stream_route(TaskRole::Writer, request(), GenerateOptions::default());
        let mut completed = String::new();
        while let Some(event) = handle.next_event().await {
            if let StreamEvent::Completed(text) = event {
                completed = text;
            }
        }
        assert!(completed.starts_with("I apologize"));
        assert!(completed.contains("draft a memo"));
        assert!(handle.is_degraded());
    }

    #[tokio::test]
    async fn test_stream_failed_fallback_is_degraded() {
        let router = router(
            ProviderRegistry::new()
                .with(Arc::new(FailingProvider("openai")))
                .with(Arc::new(FailingProvider("claude"))),
            config("openai", "claude"),
        );

        let mut handle =
            router.stream_route(TaskRole::Writer, request(), GenerateOptions::default());
        let mut completed = String::new();
        while let Some(event) = handle.next_event().await {
            if let StreamEvent::Completed(text) = event {
                completed = text;
            }
        }
        assert_eq!(completed, FINAL_APOLOGY);
        assert!(handle.is_degraded());
    }

    #[tokio::test]
    async fn test_stream_without_providers() {
        let router = router(ProviderRegistry::new(), config("openai", "claude"));
        let text = router
            .stream_route(TaskRole::Writer, request(), GenerateOptions::default())
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, NO_PROVIDERS_MESSAGE);
    }

    #[test]
    fn test_mock_apology_defaults_request() {
        assert!(mock_apology("").contains("'unknown request'"));
    }
}
