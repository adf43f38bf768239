//! Plan parsing from model responses.
//!
//! Extraction degrades through three tiers and never fails:
//!
//! 1. The whole response is a JSON object (`{` at the start)
//! 2. The span from the first `{` to the last `}` is a JSON object
//! 3. Line heuristics: `Title:` / `# ` for the title, `- ` / `* ` for sections
//!
//! When none of these yields at least one section the generic
//! [`basic_plan`] is returned. Text is only ever parsed as data; nothing in a
//! response is evaluated.

use super::plan::{DocumentPlan, PlanSection, SectionPriority};
use serde_json::Value;

/// Which tier produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Structured,
    Embedded,
    Heuristic,
    Fallback,
}

/// Parse a planner response into a plan, reporting the tier that succeeded.
pub fn parse_plan_response(response: &str) -> (DocumentPlan, PlanSource) {
    let trimmed = response.trim();

    // 1. Entire response
    if trimmed.starts_with('{')
        && let Some(plan) = parse_json_str(trimmed)
    {
        return (plan, PlanSource::Structured);
    }

    // 2. First embedded block
    if let Some(start) = trimmed.find('{')
        && let Some(end) = trimmed.rfind('}')
        && end > start
        && let Some(plan) = parse_json_str(&trimmed[start..=end])
    {
        return (plan, PlanSource::Embedded);
    }

    // 3. Line heuristics
    if let Some(plan) = parse_plan_text(trimmed) {
        return (plan, PlanSource::Heuristic);
    }

    (basic_plan(), PlanSource::Fallback)
}

fn parse_json_str(text: &str) -> Option<DocumentPlan> {
    let value: Value = serde_json::from_str(text).ok()?;
    parse_plan_json(&value)
}

/// Build a plan from a JSON value.
///
/// Expected schema:
/// ```json
/// {
///   "document_type": "string (default \"document\")",
///   "title": "string (default \"Untitled Document\")",
///   "sections": [
///     {"title": "...", "description": "...", "estimated_words": 200, "priority": "high|medium|low"}
///   ],
///   "estimated_time": 300
/// }
/// ```
///
/// Returns `None` if the value is not an object or has no usable sections.
pub fn parse_plan_json(json: &Value) -> Option<DocumentPlan> {
    let obj = json.as_object()?;
    let sections_json = obj.get("sections")?.as_array()?;

    let sections: Vec<PlanSection> = sections_json.iter().filter_map(parse_section).collect();
    if sections.is_empty() {
        return None;
    }

    let document_type = non_empty_str(obj.get("document_type")).unwrap_or("document");
    let title = non_empty_str(obj.get("title")).unwrap_or("Untitled Document");
    let estimated_time = obj
        .get("estimated_time")
        .and_then(json_u64)
        .unwrap_or(300);

    Some(DocumentPlan::new(document_type, title, sections, estimated_time))
}

fn parse_section(value: &Value) -> Option<PlanSection> {
    // Bare strings are accepted as section titles
    if let Some(title) = value.as_str() {
        let title = title.trim();
        return (!title.is_empty()).then(|| PlanSection::new(title, ""));
    }

    let obj = value.as_object()?;
    let title = non_empty_str(obj.get("title"))?;
    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let mut section = PlanSection::new(title, description);

    if let Some(words) = obj.get("estimated_words").and_then(json_u64) {
        section = section.with_words(u32::try_from(words).unwrap_or(u32::MAX));
    }
    if let Some(priority) = obj.get("priority").and_then(|v| v.as_str()) {
        section = section.with_priority(SectionPriority::parse_lenient(priority));
    }
    Some(section)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numbers, and numeric strings, as an unsigned integer.
fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Heuristic extraction from prose.
///
/// Returns `None` when no list-marker lines are found.
pub fn parse_plan_text(text: &str) -> Option<DocumentPlan> {
    let mut title = "Document".to_string();
    let mut sections = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line
            .strip_prefix("Title:")
            .or_else(|| line.strip_prefix("# "))
        {
            let rest = rest.trim();
            if !rest.is_empty() {
                title = rest.to_string();
            }
        } else if let Some(rest) = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
        {
            let rest = rest.trim();
            if !rest.is_empty() {
                sections.push(PlanSection::new(rest, ""));
            }
        }
    }

    if sections.is_empty() {
        return None;
    }
    let estimated_time = sections.len() as u64 * 300;
    Some(DocumentPlan::new("document", title, sections, estimated_time))
}

/// Generic three-section plan used when nothing could be extracted.
pub fn basic_plan() -> DocumentPlan {
    DocumentPlan::new(
        "document",
        "Document",
        vec![
            PlanSection::new("Introduction", "Document introduction")
                .with_words(150)
                .with_priority(SectionPriority::High),
            PlanSection::new("Main Content", "Main document content")
                .with_words(500)
                .with_priority(SectionPriority::High),
            PlanSection::new("Conclusion", "Document conclusion")
                .with_words(100)
                .with_priority(SectionPriority::Medium),
        ],
        900,
    )
}

/// Single-section plan used when planning itself failed.
pub fn request_fallback_plan(user_request: &str) -> DocumentPlan {
    let excerpt: String = user_request.chars().take(100).collect();
    DocumentPlan::new(
        "document",
        "Document",
        vec![
            PlanSection::new("Content", format!("Content based on: {excerpt}..."))
                .with_words(300)
                .with_priority(SectionPriority::High),
        ],
        600,
    )
}
