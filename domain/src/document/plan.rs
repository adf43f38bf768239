//! Document plan entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl SectionPriority {
    /// Lenient parse; anything unrecognised is Medium.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => SectionPriority::High,
            "low" => SectionPriority::Low,
            _ => SectionPriority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionPriority::High => "high",
            SectionPriority::Medium => "medium",
            SectionPriority::Low => "low",
        }
    }
}

impl fmt::Display for SectionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planned section of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSection {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_estimated_words")]
    pub estimated_words: u32,
    #[serde(default)]
    pub priority: SectionPriority,
}

fn default_estimated_words() -> u32 {
    200
}

impl PlanSection {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            estimated_words: default_estimated_words(),
            priority: SectionPriority::default(),
        }
    }

    pub fn with_words(mut self, words: u32) -> Self {
        self.estimated_words = words;
        self
    }

    pub fn with_priority(mut self, priority: SectionPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Plan for producing a document (Entity)
///
/// `current_step` is the index of the next section to write. The Writer
/// advances it; plan updates preserve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPlan {
    pub document_type: String,
    pub title: String,
    pub sections: Vec<PlanSection>,
    /// Estimated total effort in seconds.
    pub estimated_time: u64,
    pub current_step: usize,
    pub total_steps: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Progress summary for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub completion_percentage: f64,
    pub current_step: usize,
    pub total_steps: usize,
    pub estimated_remaining_secs: f64,
    pub next_section: Option<PlanSection>,
}

impl DocumentPlan {
    pub fn new(
        document_type: impl Into<String>,
        title: impl Into<String>,
        sections: Vec<PlanSection>,
        estimated_time: u64,
    ) -> Self {
        let now = Utc::now();
        let total_steps = sections.len();
        Self {
            document_type: document_type.into(),
            title: title.into(),
            sections,
            estimated_time,
            current_step: 0,
            total_steps,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace content fields with those of `revised`, keeping identity and cursor.
    pub fn revise(&self, revised: DocumentPlan) -> DocumentPlan {
        DocumentPlan {
            total_steps: revised.sections.len(),
            created_at: self.created_at,
            current_step: self.current_step,
            updated_at: Utc::now(),
            ..revised
        }
    }

    /// Mark sections before `step` as written.
    pub fn advance_to(&mut self, step: usize) {
        self.current_step = step.min(self.sections.len());
        self.updated_at = Utc::now();
    }

    pub fn is_complete(&self) -> bool {
        self.current_step >= self.sections.len()
    }

    /// Sections at or after the cursor, with their absolute index.
    pub fn remaining_sections(&self) -> impl Iterator<Item = (usize, &PlanSection)> {
        self.sections.iter().enumerate().skip(self.current_step)
    }

    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn progress(&self) -> PlanProgress {
        let completion_percentage = if self.total_steps > 0 {
            self.current_step as f64 / self.total_steps as f64 * 100.0
        } else {
            0.0
        };
        PlanProgress {
            completion_percentage,
            current_step: self.current_step,
            total_steps: self.total_steps,
            estimated_remaining_secs: self.estimated_time as f64
                * (1.0 - completion_percentage / 100.0),
            next_section: self.sections.get(self.current_step).cloned(),
        }
    }
}
