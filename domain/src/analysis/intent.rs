//! Intent classification.
//!
//! The orchestrator asks a model for a JSON classification and parses it
//! strictly with [`parse_analysis`]. When that fails, [`classify_request`]
//! applies deterministic keyword rules so the pipeline never depends on the
//! model producing valid structure.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateDocument,
    ModifyContent,
    AskQuestion,
    Conversation,
    GeneralAssistance,
    #[serde(other)]
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateDocument => "create_document",
            Intent::ModifyContent => "modify_content",
            Intent::AskQuestion => "ask_question",
            Intent::Conversation => "conversation",
            Intent::GeneralAssistance => "general_assistance",
            Intent::Other => "other",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which downstream agents a request needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAnalysis {
    pub intent: Intent,
    #[serde(default = "default_action")]
    pub action_needed: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub requires_planning: bool,
    #[serde(default)]
    pub requires_writing: bool,
    #[serde(default)]
    pub requires_review: bool,
    /// True when produced by the keyword rules rather than the model.
    #[serde(skip)]
    pub from_fallback: bool,
}

fn default_action() -> String {
    "respond".to_string()
}

fn default_confidence() -> f64 {
    0.5
}

impl RequestAnalysis {
    fn rule(
        intent: Intent,
        action: &str,
        confidence: f64,
        planning: bool,
        writing: bool,
        review: bool,
    ) -> Self {
        Self {
            intent,
            action_needed: action.to_string(),
            confidence,
            requires_planning: planning,
            requires_writing: writing,
            requires_review: review,
            from_fallback: true,
        }
    }

    /// No planning, writing or review needed.
    pub fn is_conversational(&self) -> bool {
        !self.requires_planning && !self.requires_writing && !self.requires_review
    }
}

const GREETING_PHRASES: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "thanks",
    "thank you",
    "how are you",
    "good morning",
    "good afternoon",
];

const AUTHORING_KEYWORDS: &[&str] = &[
    "write", "create", "draft", "generate", "make", "compose", "develop", "structure", "template",
    "outline", "proposal", "report", "document", "content", "text", "letter", "email", "plan",
    "strategy", "summary",
];

const QUESTION_PATTERNS: &[&str] = &[
    "what",
    "how",
    "why",
    "when",
    "where",
    "who",
    "explain",
    "tell me",
    "can you help",
    "how does",
    "what is",
    "what are",
];

/// Strictly parse a model classification.
///
/// Accepts a bare JSON object or the first `{`..`}` span inside prose or a
/// code fence. Anything else is rejected; text is never evaluated.
pub fn parse_analysis(response: &str) -> Option<RequestAnalysis> {
    let trimmed = response.trim();
    if let Ok(analysis) = serde_json::from_str::<RequestAnalysis>(trimmed) {
        return Some(normalize(analysis));
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<RequestAnalysis>(&trimmed[start..=end])
        .ok()
        .map(normalize)
}

fn normalize(mut analysis: RequestAnalysis) -> RequestAnalysis {
    analysis.confidence = if analysis.confidence.is_finite() {
        analysis.confidence.clamp(0.0, 1.0)
    } else {
        default_confidence()
    };
    analysis.from_fallback = false;
    analysis
}

/// Lowercased words with surrounding punctuation removed.
fn words(message: &str) -> Vec<String> {
    message
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let target: Vec<&str> = phrase.split_whitespace().collect();
    words
        .windows(target.len())
        .any(|window| window.iter().zip(&target).all(|(w, t)| w == t))
}

/// Deterministic keyword classification.
///
/// Rules, first match wins:
/// 1. Up to three words containing a greeting phrase: conversation only.
/// 2. Any authoring keyword: writing and review, no planning.
/// 3. Question phrasing: conversation only.
/// 4. Anything else: writing and review.
pub fn classify_request(message: &str) -> RequestAnalysis {
    let lower = message.trim().to_lowercase();
    let tokens = words(&lower);

    let is_greeting =
        tokens.len() <= 3 && GREETING_PHRASES.iter().any(|p| contains_phrase(&tokens, p));
    if is_greeting {
        return RequestAnalysis::rule(Intent::Conversation, "respond", 0.8, false, false, false);
    }

    if AUTHORING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return RequestAnalysis::rule(Intent::CreateDocument, "write", 0.7, false, true, true);
    }

    if QUESTION_PATTERNS.iter().any(|p| lower.contains(p)) {
        return RequestAnalysis::rule(Intent::AskQuestion, "respond", 0.6, false, false, false);
    }

    RequestAnalysis::rule(Intent::GeneralAssistance, "respond", 0.5, false, true, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Fallback rules ====================

    #[test]
    fn test_greeting_is_conversational() {
        let analysis = classify_request("hi");
        assert_eq!(analysis.intent, Intent::Conversation);
        assert!(analysis.is_conversational());
        assert!(analysis.from_fallback);
        assert_eq!(analysis.confidence, 0.8);

        assert!(classify_request("Thank you!").is_conversational());
        assert!(classify_request("good morning team").is_conversational());
    }

    #[test]
    fn test_greeting_needs_whole_word() {
        // "this" contains "hi" but is not a greeting
        let analysis = classify_request("write this");
        assert_eq!(analysis.intent, Intent::CreateDocument);
    }

    #[test]
    fn test_long_greeting_is_not_short_circuit() {
        let analysis = classify_request("hello, please draft an email to the landlord");
        assert_eq!(analysis.intent, Intent::CreateDocument);
    }

    #[test]
    fn test_authoring_request() {
        let analysis = classify_request("write a short proposal template");
        assert_eq!(analysis.intent, Intent::CreateDocument);
        assert_eq!(analysis.action_needed, "write");
        assert!(analysis.requires_writing);
        assert!(!analysis.requires_planning);
        assert!(analysis.requires_review);
    }

    #[test]
    fn test_question_without_authoring() {
        let analysis = classify_request("Why is the sky blue?");
        assert_eq!(analysis.intent, Intent::AskQuestion);
        assert!(analysis.is_conversational());
    }

    #[test]
    fn test_question_with_authoring_is_authoring() {
        let analysis = classify_request("how do I write a cover letter?");
        assert_eq!(analysis.intent, Intent::CreateDocument);
    }

    #[test]
    fn test_ambiguous_defaults_to_writing() {
        let analysis = classify_request("the quarterly numbers for Q3 look odd");
        assert_eq!(analysis.intent, Intent::GeneralAssistance);
        assert!(analysis.requires_writing);
        assert!(analysis.requires_review);
        assert!(!analysis.requires_planning);
    }

    // ==================== Strict parsing ====================

    #[test]
    fn test_parse_bare_json() {
        let analysis = parse_analysis(
            r#"{"intent": "create_document", "action_needed": "plan", "confidence": 0.9,
                "requires_planning": true, "requires_writing": true, "requires_review": true}"#,
        )
        .unwrap();
        assert_eq!(analysis.intent, Intent::CreateDocument);
        assert!(analysis.requires_planning);
        assert!(!analysis.from_fallback);
    }

    #[test]
    fn test_parse_fenced_json_and_unknown_intent() {
        let analysis = parse_analysis(
            "```json\n{\"intent\": \"brainstorm\", \"confidence\": 3.0, \"requires_writing\": true}\n```",
        )
        .unwrap();
        assert_eq!(analysis.intent, Intent::Other);
        assert_eq!(analysis.confidence, 1.0);
        assert!(analysis.requires_writing);
        assert!(!analysis.requires_review);
    }

    #[test]
    fn test_parse_rejects_python_literals() {
        assert!(parse_analysis("{'intent': 'conversation', 'requires_writing': False}").is_none());
        assert!(parse_analysis("Mock response to: hi...").is_none());
        assert!(parse_analysis(r#"{"confidence": 0.4}"#).is_none());
    }
}
