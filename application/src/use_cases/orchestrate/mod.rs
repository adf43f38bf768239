//! Document orchestration use case
//!
//! Drives one request through the pipeline:
//!
//! | Step          | Runs when                | State            |
//! |---------------|--------------------------|------------------|
//! | Analyze       | always                   | Analyzing        |
//! | Plan          | `requires_planning`      | Planning         |
//! | Write         | `requires_writing`       | Writing          |
//! | Review        | `requires_review`        | Reviewing        |
//! | DecidePreview | always                   | UpdatingPreview  |
//! | Respond       | always                   | (unchanged)      |
//!
//! The session returns to Idle afterwards. A cancelled or panicking request
//! forces the session into Error and yields a failed
//! [`OrchestrationResult`]; nothing escapes as an error value.

mod activity_log;
mod types;

pub use types::{OrchestrationError, OrchestrationRequest, OrchestratorState};

use activity_log::ActivityLog;

use crate::agents::{PlannerAgent, ReviewerAgent, WriterAgent};
use crate::config::{AgentConfigStore, PipelineParams};
use crate::ports::activity::{ActivityHub, ActivityObserver, ObserverHandle};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::notifier::{NoPushNotifier, PushEvent, PushNotifier};
use crate::ports::persistence::DocumentStore;
use crate::ports::provider::{GenerateOptions, StreamHandle};
use crate::routing::ProviderRouter;
use crate::session::{SessionContext, SessionRegistry};
use docuforge_domain::{
    AgentAction, AgentConfig, AgentMessage, AgentMessageType, DocumentPromptTemplate, DomainError,
    ExecutionSummary, OrchestrationResult, PipelineState, PreviewPolicy,
    RequestAnalysis, SessionId, StreamEvent, TaskContext, TaskRole, classify_request,
    parse_analysis, word_count,
};
use futures::FutureExt;
use serde_json::{Map, Value, json};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const ORCHESTRATOR: &str = "orchestrator";
const PLANNER: &str = "planner";
const WRITER: &str = "writer";
const REVIEWER: &str = "reviewer";

fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), OrchestrationError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(OrchestrationError::Cancelled);
    }
    Ok(())
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Coordinates the planner, writer and reviewer for every session.
pub struct DocumentOrchestrator {
    router: ProviderRouter,
    configs: Arc<AgentConfigStore>,
    sessions: SessionRegistry,
    observers: Arc<ActivityHub>,
    store: Option<Arc<dyn DocumentStore>>,
    notifier: Arc<dyn PushNotifier>,
    logger: Arc<dyn ConversationLogger>,
    params: PipelineParams,
    preview_policy: PreviewPolicy,
    activity_ids: Arc<AtomicU64>,
}

impl DocumentOrchestrator {
    /// `router` supplies the providers; role assignments come from `configs`
    /// per session.
    pub fn new(router: ProviderRouter, configs: Arc<AgentConfigStore>) -> Self {
        let params = PipelineParams::default();
        Self {
            router,
            configs,
            sessions: SessionRegistry::new(),
            observers: Arc::new(ActivityHub::new()),
            store: None,
            notifier: Arc::new(NoPushNotifier),
            logger: Arc::new(NoConversationLogger),
            preview_policy: PreviewPolicy::default()
                .with_min_interval(params.preview_min_interval),
            params,
            activity_ids: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PushNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Also used for the transition log of every session created afterwards.
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.sessions = SessionRegistry::new().with_logger(logger.clone());
        self.logger = logger;
        self
    }

    pub fn with_params(mut self, params: PipelineParams) -> Self {
        self.preview_policy = self
            .preview_policy
            .with_min_interval(params.preview_min_interval);
        self.params = params;
        self
    }

    pub fn with_observers(mut self, observers: Arc<ActivityHub>) -> Self {
        self.observers = observers;
        self
    }

    // ==================== Observers ====================

    pub fn register_observer(&self, observer: Arc<dyn ActivityObserver>) -> ObserverHandle {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&self, handle: ObserverHandle) -> bool {
        self.observers.unregister(handle)
    }

    // ==================== Configuration ====================

    pub fn get_config(&self, session: Option<&SessionId>) -> Arc<AgentConfig> {
        self.configs.get(session)
    }

    pub fn set_config(
        &self,
        session: Option<&SessionId>,
        config: AgentConfig,
    ) -> Result<Arc<AgentConfig>, DomainError> {
        Ok(self.configs.set(session, config)?)
    }

    pub fn update_config(
        &self,
        session: Option<&SessionId>,
        updates: &Map<String, Value>,
    ) -> Result<Arc<AgentConfig>, DomainError> {
        Ok(self.configs.update(session, updates)?)
    }

    // ==================== Sessions ====================

    /// Introspection view of a session. Unknown ids report a fresh, idle
    /// session without registering one.
    pub fn current_state(&self, session_id: &SessionId) -> OrchestratorState {
        let session = self
            .sessions
            .get(session_id)
            .unwrap_or_else(|| Arc::new(SessionContext::new(session_id.clone())));
        let plan = session.plan();
        OrchestratorState {
            session_id: session_id.clone(),
            snapshot: session.snapshot(),
            pending_messages: session.pending_messages(),
            plan_exists: plan.is_some(),
            plan_progress: plan.as_ref().map(PlannerAgent::analyze_progress),
            config: self.configs.get(Some(session_id)).as_ref().clone(),
            available_providers: self.router.available_providers(),
        }
    }

    /// Take the agent messages queued for a session.
    pub fn drain_messages(&self, session_id: &SessionId) -> Vec<AgentMessage> {
        self.sessions
            .get(session_id)
            .map(|session| session.drain_messages())
            .unwrap_or_default()
    }

    /// Drop a session's state and configuration override.
    pub fn end_session(&self, session_id: &SessionId) -> bool {
        self.configs.clear(session_id);
        self.sessions.remove(session_id)
    }

    // ==================== Request Processing ====================

    /// Run one request through the pipeline.
    ///
    /// Requests for the same session are processed one at a time.
    pub async fn process_user_request(&self, request: OrchestrationRequest) -> OrchestrationResult {
        let started = Instant::now();
        let session = self.sessions.get_or_create(&request.session_id);
        let _gate = session.begin_request().await;

        info!(
            session = %request.session_id,
            conversation = ?request.conversation_id.as_ref().map(|c| c.as_str()),
            history = request.history.len(),
            "Processing user request"
        );

        let mut log = ActivityLog::new(
            request.session_id.clone(),
            self.observers.clone(),
            self.notifier.clone(),
            self.activity_ids.clone(),
        );

        let outcome = AssertUnwindSafe(self.run(&session, &request, &mut log))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(OrchestrationError::Panicked(panic_message(payload))));

        let elapsed = started.elapsed().as_secs_f64();
        match outcome {
            Ok((response, summary)) => {
                session.reset_to_idle(ORCHESTRATOR, "Request processing complete");
                info!(
                    session = %request.session_id,
                    elapsed_ms = (elapsed * 1000.0) as u64,
                    "Request processed"
                );
                OrchestrationResult::succeeded(response, summary, log.into_records(), elapsed)
            }
            Err(e) => {
                error!(session = %request.session_id, "Error processing user request: {}", e);
                session.force_error(ORCHESTRATOR, &format!("Error: {e}"));
                log.error(ORCHESTRATOR, "Processing failed", e.to_string())
                    .await;
                OrchestrationResult::failed(e.to_string(), log.into_records(), elapsed)
            }
        }
    }

    async fn run(
        &self,
        session: &SessionContext,
        request: &OrchestrationRequest,
        log: &mut ActivityLog,
    ) -> Result<(String, ExecutionSummary), OrchestrationError> {
        let token = request.cancellation.clone();
        check_cancelled(&token)?;

        let router = self.router.with_config(self.configs.get(Some(session.id())));
        let options = self.call_options(&token);
        let mut ctx = TaskContext::new(session.id().clone(), request.message.clone())
            .with_conversation(request.conversation_id.clone())
            .with_history(request.history.clone())
            .with_plan(session.plan());
        let mut summary = ExecutionSummary::default();

        // Analyze
        session.transition(
            PipelineState::Analyzing,
            ORCHESTRATOR,
            "Starting analysis of user request",
        );
        let step = log
            .start(ORCHESTRATOR, "Analyzing user request", Some(ctx.user_message.clone()))
            .await;
        let analysis = self.analyze(&router, &options, &ctx).await;
        log.complete(step, Some(format!("Intent: {}", analysis.intent)))
            .await;
        summary.intent = Some(analysis.intent);
        check_cancelled(&token)?;

        if analysis.requires_planning {
            self.plan(session, &router, &options, &analysis, &mut ctx, log)
                .await;
            summary.plan_updated = true;
            check_cancelled(&token)?;
        }

        if analysis.is_conversational() {
            let step = log
                .start(
                    ORCHESTRATOR,
                    "Preparing conversational response",
                    Some(format!("Intent: {}", analysis.intent)),
                )
                .await;
            if !self.params.conversational_delay.is_zero() {
                tokio::time::sleep(self.params.conversational_delay).await;
            }
            log.complete(step, Some("Ready to generate response".to_string()))
                .await;
        }

        if analysis.requires_writing {
            self.write(session, &router, &options, &analysis, &mut ctx, &mut summary, log)
                .await;
            check_cancelled(&token)?;
        }

        if analysis.requires_review {
            self.review(session, &router, &options, &ctx, &mut summary, log)
                .await;
            check_cancelled(&token)?;
        }

        let last_action = if analysis.requires_review {
            AgentAction::ReviewContent
        } else if analysis.requires_writing {
            AgentAction::WriteContent
        } else {
            AgentAction::AnalyzeRequest
        };
        self.decide_preview(session, last_action, &mut summary, log)
            .await;

        // Respond
        let step = log
            .start(
                ORCHESTRATOR,
                "Generating final response",
                Some("Compiling agent results into user response".to_string()),
            )
            .await;
        let messages = DocumentPromptTemplate::final_response(
            &summary,
            ctx.current_plan.is_some(),
            &ctx.user_message,
        );
        let response = router
            .route(TaskRole::Orchestrator, &messages, &options)
            .await;
        check_cancelled(&token)?;
        log.complete(
            step,
            Some(format!("Response ready: {} words", word_count(&response))),
        )
        .await;

        session.set_plan(ctx.current_plan.take());
        Ok((response, summary))
    }

    fn call_options(&self, token: &Option<CancellationToken>) -> GenerateOptions {
        let mut options = GenerateOptions::default();
        if let Some(timeout) = self.params.call_timeout {
            options = options.with_timeout(timeout);
        }
        if let Some(token) = token {
            options = options.with_cancellation(token.clone());
        }
        options
    }

    async fn analyze(
        &self,
        router: &ProviderRouter,
        options: &GenerateOptions,
        ctx: &TaskContext,
    ) -> RequestAnalysis {
        let messages = DocumentPromptTemplate::analysis(
            ctx.session_id.as_str(),
            ctx.current_plan.is_some(),
            ctx.history.len(),
            &ctx.user_message,
        );
        let response = router
            .route_detailed(TaskRole::Orchestrator, &messages, options)
            .await;

        let parsed = if response.is_degraded() {
            None
        } else {
            parse_analysis(&response.text)
        };
        let analysis = parsed.unwrap_or_else(|| {
            debug!("Analysis response unparseable, using keyword rules");
            classify_request(&ctx.user_message)
        });
        info!(
            intent = %analysis.intent,
            planning = analysis.requires_planning,
            writing = analysis.requires_writing,
            review = analysis.requires_review,
            fallback = analysis.from_fallback,
            "Request analyzed"
        );
        analysis
    }

    async fn plan(
        &self,
        session: &SessionContext,
        router: &ProviderRouter,
        options: &GenerateOptions,
        analysis: &RequestAnalysis,
        ctx: &mut TaskContext,
        log: &mut ActivityLog,
    ) {
        session.transition(PipelineState::Planning, PLANNER, "Creating document plan");
        let step = log.start(PLANNER, "Creating document plan", None).await;

        let planner = PlannerAgent::new(router.clone()).with_options(options.clone());
        let plan = match &ctx.current_plan {
            Some(current) => planner.update_plan(current, &ctx.user_message).await,
            None => planner.create_plan(&ctx.user_message, Some(analysis)).await,
        };
        let sections = plan.sections.len();

        log.complete(step, Some(format!("Plan created with {sections} sections")))
            .await;
        self.logger.log(ConversationEvent::new(
            "plan_created",
            json!({
                "session_id": session.id().as_str(),
                "title": plan.title,
                "document_type": plan.document_type,
                "sections": sections,
            }),
        ));
        session.push_message(AgentMessage::new(
            PLANNER,
            AgentMessageType::PlanCreated,
            format!("Created document plan with {sections} sections"),
            json!({ "sections": sections, "title": plan.title }),
        ));
        ctx.current_plan = Some(plan);

        log.handoff(
            ORCHESTRATOR,
            "Plan created, handing off to writer",
            "Plan ready for content generation",
        )
        .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn write(
        &self,
        session: &SessionContext,
        router: &ProviderRouter,
        options: &GenerateOptions,
        analysis: &RequestAnalysis,
        ctx: &mut TaskContext,
        summary: &mut ExecutionSummary,
        log: &mut ActivityLog,
    ) {
        session.transition(PipelineState::Writing, WRITER, "Generating content");
        let step = log
            .start(WRITER, "Generating document content", Some(ctx.user_message.clone()))
            .await;
        self.notify(
            session.id(),
            PushEvent::DocumentStreamingStart {
                user_request: ctx.user_message.clone(),
            },
        )
        .await;

        let writer = WriterAgent::new(router.clone())
            .with_store(self.store.clone())
            .with_notifier(self.notifier.clone())
            .with_options(options.clone())
            .with_history_window(self.params.history_window);
        let outcome = writer.write(ctx).await;

        if outcome.success {
            log.complete(step, Some(format!("{} words written", outcome.words_written)))
                .await;
            if outcome.document_updated() {
                log.handoff(
                    ORCHESTRATOR,
                    "Saving content to document",
                    format!("Document updated with {} words", outcome.words_written),
                )
                .await;
            }
        } else {
            let reason = outcome
                .error
                .clone()
                .unwrap_or_else(|| "Writing failed".to_string());
            log.fail(step, reason).await;
        }

        summary.content_generated = outcome.success;
        summary.words_written = outcome.words_written;
        summary.sections_completed = outcome.sections_completed;
        summary.document_updated = outcome.document_updated();

        if analysis.requires_review {
            log.handoff(
                ORCHESTRATOR,
                "Writer completed, sending to reviewer",
                format!(
                    "Content ready for review: {} words",
                    outcome.words_written
                ),
            )
            .await;
        }

        session.push_message(AgentMessage::new(
            WRITER,
            AgentMessageType::ContentGenerated,
            format!("Generated {} words", outcome.words_written),
            json!({
                "success": outcome.success,
                "words_written": outcome.words_written,
                "sections_completed": outcome.sections_completed,
                "document_updated": outcome.document_updated(),
            }),
        ));
    }

    async fn review(
        &self,
        session: &SessionContext,
        router: &ProviderRouter,
        options: &GenerateOptions,
        ctx: &TaskContext,
        summary: &mut ExecutionSummary,
        log: &mut ActivityLog,
    ) {
        session.transition(PipelineState::Reviewing, REVIEWER, "Reviewing content");
        let step = log.start(REVIEWER, "Reviewing content quality", None).await;

        let reviewer = ReviewerAgent::new(router.clone()).with_options(options.clone());
        let content = ctx
            .generated_content
            .as_deref()
            .unwrap_or(ctx.user_message.as_str());
        let review = reviewer
            .review(content, ctx.current_plan.as_ref(), &ctx.user_message)
            .await;

        if review.success {
            log.complete(step, Some(format!("Review score: {}/10", review.score)))
                .await;
        } else {
            let reason = review
                .error
                .clone()
                .unwrap_or_else(|| "Review failed".to_string());
            log.fail(step, reason).await;
        }
        self.logger.log(ConversationEvent::new(
            "review_completed",
            json!({
                "session_id": session.id().as_str(),
                "success": review.success,
                "score": review.score,
                "revision_needed": review.revision_needed,
            }),
        ));

        summary.content_reviewed = review.success;
        if review.success {
            summary.review_score = Some(review.score);
        }

        log.handoff(
            ORCHESTRATOR,
            "Review completed, finalizing response",
            format!(
                "Review score: {}/10, ready for final response",
                review.score
            ),
        )
        .await;

        session.push_message(AgentMessage::new(
            REVIEWER,
            AgentMessageType::ContentReviewed,
            format!("Content review complete. Score: {}/10", review.score),
            serde_json::to_value(&review).unwrap_or(Value::Null),
        ));
    }

    async fn decide_preview(
        &self,
        session: &SessionContext,
        last_action: AgentAction,
        summary: &mut ExecutionSummary,
        log: &mut ActivityLog,
    ) {
        let now = Instant::now();
        let decision = self.preview_policy.decide(
            session.state(),
            last_action,
            session.seconds_since_preview(now),
            summary.words_written,
            false,
        );
        debug!(
            update = decision.update,
            reason = decision.reason,
            last_action = %last_action,
            "Preview decision"
        );
        if !decision.update {
            return;
        }

        session.transition(
            PipelineState::UpdatingPreview,
            ORCHESTRATOR,
            "Updating document preview",
        );
        session.record_preview(now);
        session.push_message(AgentMessage::new(
            ORCHESTRATOR,
            AgentMessageType::PreviewUpdated,
            "Document preview has been updated",
            json!({ "update_reason": decision.reason }),
        ));
        log.handoff(
            ORCHESTRATOR,
            "Coordinating preview update",
            "Preview update scheduled",
        )
        .await;
        summary.preview_updated = true;
    }

    async fn notify(&self, session: &SessionId, event: PushEvent) {
        let kind = event.kind();
        if let Err(e) = self.notifier.broadcast(session, event).await {
            debug!(session = %session, kind, "Push notification dropped: {}", e);
        }
    }

    // ==================== Streaming ====================

    /// Process `request` and stream the reply word by word.
    ///
    /// Activity records flow through the registered observers exactly as for
    /// [`process_user_request`](Self::process_user_request). A failed request
    /// yields a single `Error: ...` fragment.
    pub fn stream_response(self: &Arc<Self>, request: OrchestrationRequest) -> StreamHandle {
        let (tx, rx) = mpsc::channel(32);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let result = orchestrator.process_user_request(request).await;
            let text = match (result.success, result.response, result.error) {
                (true, Some(response), _) => response,
                (_, _, error) => {
                    let message = format!("Error: {}", error.unwrap_or_default());
                    let _ = tx.send(StreamEvent::Delta(message.clone())).await;
                    let _ = tx.send(StreamEvent::Completed(message)).await;
                    return;
                }
            };

            let delay = orchestrator.params.response_word_delay;
            for word in text.split_whitespace() {
                if tx.send(StreamEvent::Delta(format!("{word} "))).await.is_err() {
                    return;
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            let _ = tx.send(StreamEvent::Completed(text)).await;
        });
        StreamHandle::new(rx)
    }
}
