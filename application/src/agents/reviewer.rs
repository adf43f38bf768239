//! Reviewer agent
//!
//! Asks the reviewer model for a critique and extracts a score, feedback
//! and capped lists of suggestions from free text.

use crate::ports::provider::GenerateOptions;
use crate::routing::ProviderRouter;
use docuforge_domain::review::parsing::{
    extract_grammar_issues, extract_grammar_suggestions, extract_improvement_suggestions,
    extract_missing_sections, extract_review_score,
};
use docuforge_domain::{
    CompletenessAssessment, DocumentPlan, DocumentPromptTemplate, GrammarCheck, ReviewResult,
    TaskRole, parse_review_text,
};
use tracing::{info, warn};

/// Returned by [`ReviewerAgent::suggest_improvements`] when nothing usable came back.
pub const DEFAULT_REVIEW_SUGGESTIONS: [&str; 2] =
    ["Review content for clarity", "Check grammar and spelling"];

pub struct ReviewerAgent {
    router: ProviderRouter,
    options: GenerateOptions,
}

impl ReviewerAgent {
    pub fn new(router: ProviderRouter) -> Self {
        Self {
            router,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn review(
        &self,
        content: &str,
        plan: Option<&DocumentPlan>,
        user_request: &str,
    ) -> ReviewResult {
        let messages = DocumentPromptTemplate::review(content, plan, user_request);
        let response = self
            .router
            .route_detailed(TaskRole::Reviewer, &messages, &self.options)
            .await;

        if response.is_degraded() {
            warn!("Reviewer got no model answer");
            return ReviewResult::failed(response.text);
        }

        let result = parse_review_text(&response.text);
        info!(
            score = result.score,
            revision_needed = result.revision_needed,
            "Review completed"
        );
        result
    }

    pub async fn check_grammar(&self, content: &str) -> GrammarCheck {
        let messages = DocumentPromptTemplate::grammar_check(content);
        let response = self
            .router
            .route_detailed(TaskRole::Reviewer, &messages, &self.options)
            .await;

        if response.is_degraded() {
            return GrammarCheck::failed(response.text);
        }
        GrammarCheck {
            success: true,
            issues_found: extract_grammar_issues(&response.text),
            suggestions: extract_grammar_suggestions(&response.text),
            overall_assessment: response.text,
            error: None,
        }
    }

    /// Compare `content` against the plan's section titles.
    pub async fn assess_completeness(
        &self,
        content: &str,
        plan: Option<&DocumentPlan>,
    ) -> CompletenessAssessment {
        let Some(plan) = plan else {
            return CompletenessAssessment::without_plan();
        };

        let messages = DocumentPromptTemplate::completeness(content, plan);
        let response = self
            .router
            .route_detailed(TaskRole::Reviewer, &messages, &self.options)
            .await;

        if response.is_degraded() {
            return CompletenessAssessment::failed(response.text);
        }
        CompletenessAssessment {
            success: true,
            completeness_score: extract_review_score(&response.text),
            missing_sections: extract_missing_sections(&response.text),
            assessment: response.text,
            error: None,
        }
    }

    pub async fn suggest_improvements(&self, review: &ReviewResult, content: &str) -> Vec<String> {
        let messages = DocumentPromptTemplate::review_improvements(review, content);
        let response = self
            .router
            .route_detailed(TaskRole::Reviewer, &messages, &self.options)
            .await;

        let suggestions = if response.is_degraded() {
            Vec::new()
        } else {
            extract_improvement_suggestions(&response.text)
        };
        if suggestions.is_empty() {
            return DEFAULT_REVIEW_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingProvider, ScriptedProvider, router_with};
    use docuforge_domain::basic_plan;
    use std::sync::Arc;

    const CRITIQUE: &str = "Score: 6/10\n\
        The draft is clear but thin.\n\
        - Consider adding a budget table\n\
        - Improve the closing paragraph\n\
        Strengths: well organized";

    #[tokio::test]
    async fn test_review_parses_critique() {
        let reviewer = ReviewerAgent::new(router_with(ScriptedProvider::new("claude", &[CRITIQUE])));
        let result = reviewer.review("draft", None, "write a proposal").await;

        assert!(result.success);
        assert_eq!(result.score, 6);
        assert!(result.revision_needed);
        assert!(!result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_review_failure_shape() {
        let reviewer = ReviewerAgent::new(router_with(Arc::new(FailingProvider("claude"))));
        let result = reviewer.review("draft", None, "write").await;

        assert!(!result.success);
        assert_eq!(result.score, 5);
        assert!(result.revision_needed);
    }

    #[tokio::test]
    async fn test_completeness_without_plan_skips_model() {
        let provider = ScriptedProvider::new("claude", &["unused"]);
        let reviewer = ReviewerAgent::new(router_with(provider.clone()));

        let assessment = reviewer.assess_completeness("text", None).await;

        assert_eq!(assessment.completeness_score, 8);
        assert!(assessment.missing_sections.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_completeness_with_plan() {
        let reviewer = ReviewerAgent::new(router_with(ScriptedProvider::new(
            "claude",
            &["Completeness: 4/10\nThe Conclusion section is missing."],
        )));

        let assessment = reviewer.assess_completeness("text", Some(&basic_plan())).await;

        assert!(assessment.success);
        assert_eq!(assessment.completeness_score, 4);
        assert_eq!(assessment.missing_sections.len(), 1);
    }

    #[tokio::test]
    async fn test_grammar_check() {
        let reviewer = ReviewerAgent::new(router_with(ScriptedProvider::new(
            "claude",
            &["There is a spelling mistake in line 2.\n- Replace 'teh' with 'the'"],
        )));

        let check = reviewer.check_grammar("teh text").await;

        assert!(check.success);
        assert_eq!(check.issues_found, vec!["There is a spelling mistake in line 2."]);
        assert_eq!(check.suggestions, vec!["Replace 'teh' with 'the'"]);
    }

    #[tokio::test]
    async fn test_suggest_improvements_fallback() {
        let reviewer = ReviewerAgent::new(router_with(Arc::new(FailingProvider("claude"))));
        let review = ReviewResult::failed("x");
        assert_eq!(
            reviewer.suggest_improvements(&review, "text").await,
            DEFAULT_REVIEW_SUGGESTIONS.to_vec()
        );
    }
}
