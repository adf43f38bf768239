//! Planner agent
//!
//! Turns a request into a [`DocumentPlan`]. Model output is parsed in tiers
//! (whole JSON, embedded JSON, list heuristics) and bottoms out at a fixed
//! three-section plan, so planning never fails.

use crate::ports::provider::GenerateOptions;
use crate::routing::ProviderRouter;
use docuforge_domain::{
    DocumentPlan, DocumentPromptTemplate, PlanProgress, PlanSource, RequestAnalysis, TaskRole,
    parse_plan_response, request_fallback_plan,
};
use tracing::{info, warn};

/// Returned by [`PlannerAgent::suggest_improvements`] when no model answers.
pub const DEFAULT_PLAN_SUGGESTIONS: [&str; 2] = [
    "Consider adding more detail to sections",
    "Review section order",
];

pub struct PlannerAgent {
    router: ProviderRouter,
    options: GenerateOptions,
}

impl PlannerAgent {
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

    /// Create a new plan for `user_request`.
    pub async fn create_plan(
        &self,
        user_request: &str,
        analysis: Option<&RequestAnalysis>,
    ) -> DocumentPlan {
        let messages = DocumentPromptTemplate::planning(user_request, analysis);
        let response = self
            .router
            .route_detailed(TaskRole::Planner, &messages, &self.options)
            .await;

        if response.is_degraded() {
            warn!("Planner got no model answer, using request fallback plan");
            return request_fallback_plan(user_request);
        }

        let (plan, source) = parse_plan_response(&response.text);
        info!(
            sections = plan.sections.len(),
            source = ?source,
            "Created plan '{}'",
            plan.title
        );
        plan
    }

    /// Revise `current` for a follow-up request.
    ///
    /// Keeps the creation time and step cursor. Returns `current` unchanged
    /// when the model gives no usable plan.
    pub async fn update_plan(&self, current: &DocumentPlan, user_request: &str) -> DocumentPlan {
        let messages = DocumentPromptTemplate::plan_update(current, user_request);
        let response = self
            .router
            .route_detailed(TaskRole::Planner, &messages, &self.options)
            .await;

        if response.is_degraded() {
            warn!("Planner got no model answer, keeping current plan");
            return current.clone();
        }

        let (revised, source) = parse_plan_response(&response.text);
        if source == PlanSource::Fallback {
            warn!("Plan update was unparseable, keeping current plan");
            return current.clone();
        }

        let updated = current.revise(revised);
        info!(sections = updated.sections.len(), "Updated plan '{}'", updated.title);
        updated
    }

    pub fn analyze_progress(plan: &DocumentPlan) -> PlanProgress {
        plan.progress()
    }

    /// Ask the model for ways to improve `plan`, one suggestion per line.
    pub async fn suggest_improvements(&self, plan: &DocumentPlan) -> Vec<String> {
        let messages = DocumentPromptTemplate::plan_improvements(plan);
        let response = self
            .router
            .route_detailed(TaskRole::Planner, &messages, &self.options)
            .await;

        let suggestions: Vec<String> = if response.is_degraded() {
            Vec::new()
        } else {
            response
                .text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        };

        if suggestions.is_empty() {
            return DEFAULT_PLAN_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        }
        suggestions
    }
}
