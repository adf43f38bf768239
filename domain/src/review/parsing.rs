//! Review response parsing.
//!
//! These functions extract structured values from free-form critiques.
//! They are pure domain logic: text pattern matching with explicit caps.
//!
//! | Function | Extracts | Gate | Cap |
//! |----------|----------|------|-----|
//! | [`extract_review_score`] | integer 1-10 | `score: N`, `N/10`, `rating: N` |: |
//! | [`extract_feedback`] | free text | lines after feedback/analysis/review |: |
//! | [`extract_suggestions`] | list items | suggest/recommend/consider/try | 5 |
//! | [`extract_areas_for_improvement`] | lines | improve/better/enhance/fix | 3 |
//! | [`extract_strengths`] | lines | good/strong/excellent/well | 3 |

use super::entities::{REVISION_THRESHOLD, ReviewResult};
use regex::Regex;
use std::sync::LazyLock;

/// Score used when no pattern matches.
pub const DEFAULT_SCORE: u8 = 7;

const MAX_SUGGESTIONS: usize = 5;
const MAX_AREAS: usize = 3;
const MAX_STRENGTHS: usize = 3;
const MAX_IMPROVEMENTS: usize = 10;
const FEEDBACK_EXCERPT_CHARS: usize = 200;

static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"score[:\s]*(\d+)(?:/10)?", r"(\d+)/10", r"rating[:\s]*(\d+)"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Extract a 1-10 score from a critique.
///
/// Patterns are tried in order against the lowercased text; the first match
/// wins and is clamped to `[1, 10]`. Returns [`DEFAULT_SCORE`] when nothing
/// matches.
///
/// # Examples
///
/// ```
/// use docuforge_domain::review::parsing::extract_review_score;
///
/// assert_eq!(extract_review_score("Score: 9/10"), 9);
/// assert_eq!(extract_review_score("rating: 13"), 10);
/// assert_eq!(extract_review_score("No numbers here"), 7);
/// ```
pub fn extract_review_score(response: &str) -> u8 {
    let lower = response.to_lowercase();
    for pattern in SCORE_PATTERNS.iter() {
        if let Some(digits) = pattern.captures(&lower).and_then(|c| c.get(1)) {
            // Overlong digit runs saturate and clamp to the top of the range
            let raw = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
            return raw.clamp(1, 10) as u8;
        }
    }
    DEFAULT_SCORE
}

fn contains_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn strip_list_marker(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

/// Lines following a feedback/analysis/review header, up to the next
/// suggestion/improvement/strength header. Falls back to the first 200
/// characters of the response.
pub fn extract_feedback(response: &str) -> String {
    let mut lines = Vec::new();
    let mut in_feedback = false;

    for line in response.lines() {
        let line = line.trim();
        if contains_any(line, &["feedback", "analysis", "review"]) {
            in_feedback = true;
        } else if contains_any(line, &["suggestion", "improvement", "strength"]) {
            in_feedback = false;
        } else if in_feedback && !line.is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        response.chars().take(FEEDBACK_EXCERPT_CHARS).collect()
    } else {
        lines.join("\n")
    }
}

/// List items that read as advice.
pub fn extract_suggestions(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| strip_list_marker(line.trim()))
        .map(str::trim)
        .filter(|item| contains_any(item, &["suggest", "recommend", "consider", "try"]))
        .take(MAX_SUGGESTIONS)
        .map(String::from)
        .collect()
}

pub fn extract_areas_for_improvement(response: &str) -> Vec<String> {
    keyword_lines(response, &["improve", "better", "enhance", "fix"], MAX_AREAS)
}

pub fn extract_strengths(response: &str) -> Vec<String> {
    keyword_lines(response, &["good", "strong", "excellent", "well"], MAX_STRENGTHS)
}

pub fn extract_missing_sections(response: &str) -> Vec<String> {
    keyword_lines(
        response,
        &["missing", "absent", "not found", "lacking"],
        usize::MAX,
    )
}

pub fn extract_grammar_issues(response: &str) -> Vec<String> {
    keyword_lines(
        response,
        &["error", "mistake", "incorrect", "issue"],
        usize::MAX,
    )
}

pub fn extract_grammar_suggestions(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| strip_list_marker(line.trim()))
        .map(str::trim)
        .filter(|item| contains_any(item, &["change", "replace", "correct"]))
        .map(String::from)
        .collect()
}

/// Bulleted or numbered items, markers removed, at most 10.
pub fn extract_improvement_suggestions(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with("- ")
                || line.starts_with("* ")
                || line
                    .split_once('.')
                    .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .map(|line| {
            line.trim_start_matches(|c: char| c == '-' || c == '*' || c == '.' || c == ' ' || c.is_ascii_digit())
                .trim()
        })
        .filter(|item| !item.is_empty())
        .take(MAX_IMPROVEMENTS)
        .map(String::from)
        .collect()
}

fn keyword_lines(response: &str, keywords: &[&str], cap: usize) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| contains_any(line, keywords))
        .take(cap)
        .map(String::from)
        .collect()
}

/// Parse a full critique into a successful [`ReviewResult`].
pub fn parse_review_text(response: &str) -> ReviewResult {
    let score = extract_review_score(response);
    ReviewResult {
        success: true,
        score,
        feedback: extract_feedback(response),
        suggestions: extract_suggestions(response),
        areas_for_improvement: extract_areas_for_improvement(response),
        strengths: extract_strengths(response),
        revision_needed: score < REVISION_THRESHOLD,
        error: None,
    }
}
