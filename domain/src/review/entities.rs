//! Review results

use serde::{Deserialize, Serialize};

/// Score below which a revision is recommended.
pub const REVISION_THRESHOLD: u8 = 7;

/// Structured critique of a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub success: bool,
    /// Always within 1..=10.
    pub score: u8,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub strengths: Vec<String>,
    pub revision_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewResult {
    /// Result used when the review call itself failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            score: 5,
            feedback: "Review failed".to_string(),
            suggestions: Vec::new(),
            areas_for_improvement: Vec::new(),
            strengths: Vec::new(),
            revision_needed: true,
            error: Some(error.into()),
        }
    }
}

/// Coverage of a plan's sections by written content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessAssessment {
    pub success: bool,
    pub completeness_score: u8,
    pub missing_sections: Vec<String>,
    pub assessment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletenessAssessment {
    pub fn without_plan() -> Self {
        Self {
            success: true,
            completeness_score: 8,
            missing_sections: Vec::new(),
            assessment: "No plan available for comparison".to_string(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            completeness_score: 6,
            missing_sections: Vec::new(),
            assessment: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Grammar and style findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarCheck {
    pub success: bool,
    pub issues_found: Vec<String>,
    pub suggestions: Vec<String>,
    pub overall_assessment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GrammarCheck {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            issues_found: Vec::new(),
            suggestions: Vec::new(),
            overall_assessment: String::new(),
            error: Some(error.into()),
        }
    }
}
