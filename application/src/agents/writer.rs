//! Writer agent
//!
//! Generates document text through the streaming route, forwards each
//! fragment to the push notifier and hands the finished text to the
//! document store. Persistence and notification are best effort: their
//! failures are logged and never fail the write.

use crate::ports::notifier::{NoPushNotifier, PushEvent, PushNotifier};
use crate::ports::persistence::{DocumentStore, StoredDocument};
use crate::ports::provider::GenerateOptions;
use crate::routing::ProviderRouter;
use docuforge_domain::{
    DocumentPlan, DocumentPromptTemplate, Message, SessionId, StreamEvent, TaskContext, TaskRole,
    structure_content, word_count,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Section name attached to fragments of a direct (unplanned) write.
pub const DIRECT_SECTION_NAME: &str = "Document Content";

/// Style hints cycled through by [`WriterAgent::generate_variations`].
pub const VARIATION_STYLES: [&str; 3] = [
    "more concise and direct",
    "more detailed and explanatory",
    "more engaging and conversational",
];

const UNAVAILABLE: &str = "No provider was available to write content";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOutcome {
    pub success: bool,
    pub content: String,
    pub words_written: usize,
    pub sections_completed: usize,
    /// The saved document, when a store is configured and the save worked.
    pub document: Option<StoredDocument>,
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn document_updated(&self) -> bool {
        self.document.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpandOutcome {
    pub success: bool,
    pub expanded_content: String,
    pub original_words: usize,
    pub new_words: i64,
    pub total_words: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutcome {
    pub success: bool,
    pub rewritten_content: String,
    pub original_words: usize,
    pub rewritten_words: usize,
    pub change_percentage: f64,
    pub error: Option<String>,
}

pub struct WriterAgent {
    router: ProviderRouter,
    store: Option<Arc<dyn DocumentStore>>,
    notifier: Arc<dyn PushNotifier>,
    options: GenerateOptions,
    history_window: usize,
}

impl WriterAgent {
    pub fn new(router: ProviderRouter) -> Self {
        Self {
            router,
            store: None,
            notifier: Arc::new(NoPushNotifier),
            options: GenerateOptions::default(),
            history_window: 3,
        }
    }

    pub fn with_store(mut self, store: Option<Arc<dyn DocumentStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PushNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    /// Write content for the request in `ctx`.
    ///
    /// With an unfinished plan, the remaining sections are written in order
    /// and the plan cursor advances after each one. Otherwise the whole
    /// request is written in one pass. The text is stored in
    /// `ctx.generated_content`.
    pub async fn write(&self, ctx: &mut TaskContext) -> WriteOutcome {
        info!(
            session = %ctx.session_id,
            plan = ctx.current_plan.is_some(),
            "Writing content"
        );

        let (content, sections_completed, degraded) = match ctx.current_plan.take() {
            Some(mut plan) if !plan.is_complete() => {
                let written = self.write_from_plan(ctx, &mut plan).await;
                ctx.current_plan = Some(plan);
                written
            }
            plan => {
                ctx.current_plan = plan;
                let recent = ctx.recent_history(self.history_window);
                let messages = DocumentPromptTemplate::write_direct(&ctx.user_message, recent);
                match self
                    .stream_section(&ctx.session_id, messages, DIRECT_SECTION_NAME)
                    .await
                {
                    Some(content) => (content, 0, false),
                    None => (String::new(), 0, true),
                }
            }
        };

        if degraded && sections_completed == 0 {
            warn!(session = %ctx.session_id, "No provider could write content");
            return WriteOutcome {
                success: false,
                error: Some(UNAVAILABLE.to_string()),
                ..Default::default()
            };
        }

        if content.trim().is_empty() {
            warn!(session = %ctx.session_id, "Writer produced no content");
            return WriteOutcome {
                success: false,
                error: Some("No content was generated".to_string()),
                ..Default::default()
            };
        }

        let words_written = word_count(&content);
        info!(words = words_written, sections = sections_completed, "Content generated");

        let document = self
            .persist(&ctx.session_id, &content, ctx.current_plan.as_ref())
            .await;
        self.notify(
            &ctx.session_id,
            PushEvent::DocumentContentComplete {
                final_content: content.clone(),
                word_count: words_written,
            },
        )
        .await;

        ctx.generated_content = Some(content.clone());
        WriteOutcome {
            success: true,
            content,
            words_written,
            sections_completed,
            document,
            error: None,
        }
    }

    /// Returns the text, the number of sections written and whether writing
    /// stopped at a section no provider could produce.
    async fn write_from_plan(
        &self,
        ctx: &TaskContext,
        plan: &mut DocumentPlan,
    ) -> (String, usize, bool) {
        let pending: Vec<_> = plan
            .remaining_sections()
            .map(|(index, section)| (index, section.clone()))
            .collect();

        let mut total = String::new();
        let mut completed = 0;
        for (index, section) in pending {
            if self.options.is_cancelled() {
                break;
            }

            let header = format!("\n## {}\n\n", section.title);
            self.notify(
                &ctx.session_id,
                PushEvent::DocumentContentStreaming {
                    chunk: header.clone(),
                    full_content: header,
                    section_name: Some(section.title.clone()),
                    is_header: true,
                    word_count: 0,
                },
            )
            .await;

            let messages = DocumentPromptTemplate::write_section(plan, &section, &ctx.user_message);
            let Some(body) = self
                .stream_section(&ctx.session_id, messages, &section.title)
                .await
            else {
                warn!(section = %section.title, "Section unavailable, stopping at step {}", index);
                return (total, completed, true);
            };

            total.push_str(&format!("\n## {}\n\n{}\n\n", section.title, body.trim()));
            completed += 1;
            plan.advance_to(index + 1);
            debug!(
                "Completed section '{}' with {} words",
                section.title,
                word_count(&body)
            );
        }
        (total, completed, false)
    }

    /// Stream one generation pass, forwarding each fragment.
    ///
    /// Returns `None` when the router could only offer an apology.
    async fn stream_section(
        &self,
        session: &SessionId,
        messages: Vec<Message>,
        section_name: &str,
    ) -> Option<String> {
        let mut handle = self
            .router
            .stream_route(TaskRole::Writer, messages, self.options.clone());
        let mut content = String::new();
        while let Some(event) = handle.next_event().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    content.push_str(&chunk);
                    if handle.is_degraded() {
                        continue;
                    }
                    self.notify(
                        session,
                        PushEvent::DocumentContentStreaming {
                            chunk,
                            full_content: content.clone(),
                            section_name: Some(section_name.to_string()),
                            is_header: false,
                            word_count: word_count(&content),
                        },
                    )
                    .await;
                }
                StreamEvent::Completed(_) => break,
                StreamEvent::Error(e) => {
                    warn!(section = section_name, "Writer stream ended early: {}", e);
                    break;
                }
            }
        }
        if handle.is_degraded() {
            return None;
        }
        Some(content)
    }

    async fn persist(
        &self,
        session: &SessionId,
        content: &str,
        plan: Option<&DocumentPlan>,
    ) -> Option<StoredDocument> {
        let store = self.store.as_ref()?;
        let structured = structure_content(content, plan);
        match store.save_content(session, &structured).await {
            Ok(document) => {
                info!(session = %session, "Saved content to document");
                self.notify(
                    session,
                    PushEvent::DocumentUpdated {
                        sections_count: document.sections_count(),
                        word_count: document.word_count(),
                        document: document.clone(),
                    },
                )
                .await;
                Some(document)
            }
            Err(e) => {
                error!(session = %session, "Failed to save content: {}", e);
                None
            }
        }
    }

    async fn notify(&self, session: &SessionId, event: PushEvent) {
        let kind = event.kind();
        if let Err(e) = self.notifier.broadcast(session, event).await {
            debug!(session = %session, kind, "Push notification dropped: {}", e);
        }
    }

    // ==================== Content Editing ====================

    /// Expand `existing` according to `request`.
    pub async fn expand_content(&self, existing: &str, request: &str) -> ExpandOutcome {
        let original_words = word_count(existing);
        let messages = DocumentPromptTemplate::expand(existing, request);
        let response = self
            .router
            .route_detailed(TaskRole::Writer, &messages, &self.options)
            .await;

        if response.is_degraded() {
            return ExpandOutcome {
                success: false,
                expanded_content: existing.to_string(),
                original_words,
                new_words: 0,
                total_words: original_words,
                error: Some(response.text),
            };
        }

        let total_words = word_count(&response.text);
        ExpandOutcome {
            success: true,
            expanded_content: response.text,
            original_words,
            new_words: total_words as i64 - original_words as i64,
            total_words,
            error: None,
        }
    }

    /// Rewrite `existing` according to `request`.
    pub async fn rewrite_content(&self, existing: &str, request: &str) -> RewriteOutcome {
        let original_words = word_count(existing);
        let messages = DocumentPromptTemplate::rewrite(existing, request);
        let response = self
            .router
            .route_detailed(TaskRole::Writer, &messages, &self.options)
            .await;

        if response.is_degraded() {
            return RewriteOutcome {
                success: false,
                rewritten_content: existing.to_string(),
                original_words,
                rewritten_words: original_words,
                change_percentage: 0.0,
                error: Some(response.text),
            };
        }

        let rewritten_words = word_count(&response.text);
        let change_percentage = if original_words == 0 {
            0.0
        } else {
            (rewritten_words as f64 - original_words as f64).abs() / original_words as f64 * 100.0
        };
        RewriteOutcome {
            success: true,
            rewritten_content: response.text,
            original_words,
            rewritten_words,
            change_percentage,
            error: None,
        }
    }

    /// Produce `count` restyled versions of `content`.
    ///
    /// A variation the model could not produce is replaced by the original.
    pub async fn generate_variations(&self, content: &str, count: usize) -> Vec<String> {
        let mut variations = Vec::with_capacity(count);
        for i in 0..count {
            let style = VARIATION_STYLES[i % VARIATION_STYLES.len()];
            let messages = DocumentPromptTemplate::variation(content, style);
            let response = self
                .router
                .route_detailed(TaskRole::Writer, &messages, &self.options)
                .await;
            if response.is_degraded() {
                warn!(variation = i, "Variation failed, keeping original");
                variations.push(content.to_string());
            } else {
                variations.push(response.text);
            }
        }
        variations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FailingProvider, MemoryStore, RecordingNotifier, ScriptedProvider, router_with,
    };
    use docuforge_domain::{PlanSection, basic_plan};

    fn context(message: &str) -> TaskContext {
        TaskContext::new(SessionId::new("doc-1"), message)
    }

    #[tokio::test]
    async fn test_direct_write_streams_and_saves() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemoryStore::default());
        let writer = WriterAgent::new(router_with(ScriptedProvider::new(
            "openai",
            &["# Proposal\n\nFill in [your name] here."],
        )))
        .with_store(Some(store.clone()))
        .with_notifier(notifier.clone());

        let mut ctx = context("write a short proposal template");
        let outcome = writer.write(&mut ctx).await;

        assert!(outcome.success);
        assert_eq!(outcome.words_written, 7);
        assert_eq!(outcome.sections_completed, 0);
        assert!(outcome.document_updated());
        assert_eq!(ctx.generated_content.as_deref(), Some(outcome.content.as_str()));
        assert_eq!(store.saved.lock().unwrap().len(), 1);
        assert_eq!(
            notifier.kinds(),
            vec![
                "document_content_streaming",
                "document_updated",
                "document_content_complete"
            ]
        );
    }

    #[tokio::test]
    async fn test_plan_sections_written_in_order() {
        let provider = ScriptedProvider::new("openai", &["  body text  "]);
        let notifier = Arc::new(RecordingNotifier::default());
        let writer = WriterAgent::new(router_with(provider.clone())).with_notifier(notifier.clone());

        let mut plan = basic_plan();
        plan.advance_to(1);
        let mut ctx = context("write it").with_plan(Some(plan));
        let outcome = writer.write(&mut ctx).await;

        assert_eq!(outcome.sections_completed, 2);
        assert_eq!(
            outcome.content,
            "\n## Main Content\n\nbody text\n\n\n## Conclusion\n\nbody text\n\n"
        );
        assert_eq!(provider.calls(), 2);
        let plan = ctx.current_plan.unwrap();
        assert!(plan.is_complete());

        let events = notifier.events.lock().unwrap();
        let headers: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PushEvent::DocumentContentStreaming {
                    is_header: true,
                    section_name,
                    ..
                } => section_name.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(headers, vec!["Main Content", "Conclusion"]);
    }

    #[tokio::test]
    async fn test_completed_plan_writes_directly() {
        let provider = ScriptedProvider::new("openai", &["fresh text"]);
        let writer = WriterAgent::new(router_with(provider.clone()));
        let mut plan = DocumentPlan::new("memo", "Memo", vec![PlanSection::new("Only", "")], 100);
        plan.advance_to(1);

        let mut ctx = context("more please").with_plan(Some(plan));
        let outcome = writer.write(&mut ctx).await;

        assert_eq!(outcome.content, "fresh text");
        assert_eq!(outcome.sections_completed, 0);
    }

    #[tokio::test]
    async fn test_save_failure_does_not_fail_write() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let writer = WriterAgent::new(router_with(ScriptedProvider::new("openai", &["text"])))
            .with_store(Some(store));

        let outcome = writer.write(&mut context("write")).await;

        assert!(outcome.success);
        assert!(!outcome.document_updated());
    }

    #[tokio::test]
    async fn test_apology_is_not_saved_as_content() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let writer = WriterAgent::new(router_with(Arc::new(FailingProvider("google"))))
            .with_store(Some(store.clone()))
            .with_notifier(notifier.clone());

        let mut ctx = context("write a short proposal template");
        let outcome = writer.write(&mut ctx).await;

        assert!(!outcome.success);
        assert!(!outcome.document_updated());
        assert_eq!(outcome.words_written, 0);
        assert!(ctx.generated_content.is_none());
        assert!(store.saved.lock().unwrap().is_empty());
        assert!(notifier.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_section_keeps_cursor() {
        let store = Arc::new(MemoryStore::default());
        let writer = WriterAgent::new(router_with(Arc::new(FailingProvider("google"))))
            .with_store(Some(store.clone()));

        let mut ctx = context("write it").with_plan(Some(basic_plan()));
        let outcome = writer.write(&mut ctx).await;

        assert!(!outcome.success);
        assert_eq!(outcome.sections_completed, 0);
        assert_eq!(ctx.current_plan.unwrap().current_step, 0);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_generation_is_a_failure() {
        let writer = WriterAgent::new(router_with(ScriptedProvider::new("openai", &["   "])));
        let outcome = writer.write(&mut context("write")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.words_written, 0);
    }

    #[tokio::test]
    async fn test_expand_and_rewrite() {
        let writer = WriterAgent::new(router_with(ScriptedProvider::new(
            "openai",
            &["one two three four"],
        )));

        let expanded = writer.expand_content("one two", "add more").await;
        assert!(expanded.success);
        assert_eq!(expanded.new_words, 2);
        assert_eq!(expanded.total_words, 4);

        let rewritten = writer.rewrite_content("one two", "rephrase").await;
        assert_eq!(rewritten.rewritten_words, 4);
        assert!((rewritten.change_percentage - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_edits_keep_original_on_failure() {
        let writer = WriterAgent::new(router_with(Arc::new(FailingProvider("openai"))));

        let expanded = writer.expand_content("keep me", "grow").await;
        assert!(!expanded.success);
        assert_eq!(expanded.expanded_content, "keep me");

        let rewritten = writer.rewrite_content("keep me", "change").await;
        assert_eq!(rewritten.rewritten_content, "keep me");

        let variations = writer.generate_variations("keep me", 2).await;
        assert_eq!(variations, vec!["keep me", "keep me"]);
    }

    #[tokio::test]
    async fn test_variations_cycle_styles() {
        let provider = ScriptedProvider::new("openai", &["v"]);
        let writer = WriterAgent::new(router_with(provider.clone()));

        let variations = writer.generate_variations("text", 4).await;

        assert_eq!(variations.len(), 4);
        let prompts = provider.system_prompts();
        assert!(prompts[0].contains(VARIATION_STYLES[0]));
        assert!(prompts[3].contains(VARIATION_STYLES[0]));
        assert!(prompts[1].contains(VARIATION_STYLES[1]));
    }
}
