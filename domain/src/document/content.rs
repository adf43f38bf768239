//! Structured document content handed to persistence.

use super::plan::DocumentPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_sections: usize,
}

/// Section list derived from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    #[serde(rename = "type")]
    pub document_type: String,
    pub title: String,
    pub sections: Vec<ContentSection>,
    pub metadata: ContentMetadata,
}

impl StructuredContent {
    pub fn word_count(&self) -> usize {
        self.sections.iter().map(|s| word_count(&s.content)).sum()
    }
}

/// Whitespace-token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split generated text into sections.
///
/// With a plan that has sections, the text is split on `"\n##"`: a non-empty
/// leading part becomes `Introduction`, and each later part's first line is
/// its title. Otherwise the whole text is one `Content` section.
pub fn structure_content(text: &str, plan: Option<&DocumentPlan>) -> StructuredContent {
    match plan {
        Some(plan) if !plan.sections.is_empty() => structure_with_plan(text, plan),
        _ => structure_simple(text),
    }
}

fn structure_with_plan(text: &str, plan: &DocumentPlan) -> StructuredContent {
    let mut sections = Vec::new();

    for (i, part) in text.split("\n##").enumerate() {
        if i == 0 {
            let intro = part.trim();
            if !intro.is_empty() {
                sections.push(ContentSection {
                    id: format!("section_{i}"),
                    title: "Introduction".to_string(),
                    content: intro.to_string(),
                    order: i,
                });
            }
            continue;
        }

        let part = part.trim();
        let (title, body) = part.split_once('\n').unwrap_or((part, ""));
        sections.push(ContentSection {
            id: format!("section_{i}"),
            title: title.trim().trim_start_matches('#').trim().to_string(),
            content: body.trim().to_string(),
            order: i,
        });
    }

    let total_sections = sections.len();
    StructuredContent {
        document_type: plan.document_type.clone(),
        title: plan.title.clone(),
        sections,
        metadata: ContentMetadata {
            generated_at: Utc::now(),
            total_sections,
        },
    }
}

fn structure_simple(text: &str) -> StructuredContent {
    StructuredContent {
        document_type: "document".to_string(),
        title: "Generated Document".to_string(),
        sections: vec![ContentSection {
            id: "section_0".to_string(),
            title: "Content".to_string(),
            content: text.to_string(),
            order: 0,
        }],
        metadata: ContentMetadata {
            generated_at: Utc::now(),
            total_sections: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::plan::PlanSection;

    fn plan() -> DocumentPlan {
        DocumentPlan::new(
            "memo",
            "Team Memo",
            vec![PlanSection::new("Context", ""), PlanSection::new("Ask", "")],
            600,
        )
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\n\tthree  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_structure_without_plan() {
        let content = structure_content("Hello there", None);
        assert_eq!(content.document_type, "document");
        assert_eq!(content.title, "Generated Document");
        assert_eq!(content.sections.len(), 1);
        assert_eq!(content.sections[0].title, "Content");
        assert_eq!(content.sections[0].id, "section_0");
    }

    #[test]
    fn test_structure_with_plan_splits_headings() {
        let text = "\n## Context\n\nWe moved offices.\n\n\n## Ask\n\nPlease update addresses.\n\n";
        let content = structure_content(text, Some(&plan()));
        assert_eq!(content.document_type, "memo");
        assert_eq!(content.title, "Team Memo");
        assert_eq!(content.metadata.total_sections, 2);
        assert_eq!(content.sections[0].id, "section_1");
        assert_eq!(content.sections[0].title, "Context");
        assert_eq!(content.sections[0].content, "We moved offices.");
        assert_eq!(content.sections[1].title, "Ask");
        assert_eq!(content.word_count(), 6);
    }

    #[test]
    fn test_structure_with_plan_keeps_leading_text_as_introduction() {
        let text = "Preamble text\n## Body\nMain";
        let content = structure_content(text, Some(&plan()));
        assert_eq!(content.sections[0].title, "Introduction");
        assert_eq!(content.sections[0].content, "Preamble text");
        assert_eq!(content.sections[1].title, "Body");
        assert_eq!(content.sections[1].content, "Main");
    }

    #[test]
    fn test_serialized_type_key() {
        let value = serde_json::to_value(structure_content("x", None)).unwrap();
        assert_eq!(value["type"], "document");
        assert_eq!(value["metadata"]["total_sections"], 1);
    }
}
