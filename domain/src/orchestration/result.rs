//! Orchestration results

use crate::activity::ActivityRecord;
use crate::analysis::intent::Intent;
use serde::{Deserialize, Serialize};

/// What the agents did during one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub intent: Option<Intent>,
    pub plan_updated: bool,
    pub content_generated: bool,
    pub words_written: usize,
    pub sections_completed: usize,
    pub document_updated: bool,
    pub content_reviewed: bool,
    pub review_score: Option<u8>,
    pub preview_updated: bool,
}

/// Outcome of `process_user_request`.
///
/// Always well-formed: failures carry `success = false` and an error message
/// instead of surfacing as an error value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub plan_updated: bool,
    pub preview_ready: bool,
    pub activity_log: Vec<ActivityRecord>,
    /// Seconds spent processing.
    pub processing_time: f64,
    #[serde(default)]
    pub summary: ExecutionSummary,
}

impl OrchestrationResult {
    pub fn succeeded(
        response: String,
        summary: ExecutionSummary,
        activity_log: Vec<ActivityRecord>,
        processing_time: f64,
    ) -> Self {
        Self {
            success: true,
            response: Some(response),
            error: None,
            plan_updated: summary.plan_updated,
            preview_ready: summary.preview_updated,
            activity_log,
            processing_time,
            summary,
        }
    }

    pub fn failed(
        error: impl Into<String>,
        activity_log: Vec<ActivityRecord>,
        processing_time: f64,
    ) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
            plan_updated: false,
            preview_ready: false,
            activity_log,
            processing_time,
            summary: ExecutionSummary::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let result = OrchestrationResult::failed("provider exploded", vec![], 0.1);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "provider exploded");
        assert!(value.get("response").is_none());
        assert!(value["activity_log"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_success_copies_flags() {
        let summary = ExecutionSummary {
            plan_updated: true,
            preview_updated: true,
            ..Default::default()
        };
        let result = OrchestrationResult::succeeded("done".to_string(), summary, vec![], 1.5);
        assert!(result.success);
        assert!(result.plan_updated);
        assert!(result.preview_ready);
    }
}
