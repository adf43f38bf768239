//! Prompt templates for the document pipeline

use crate::analysis::intent::RequestAnalysis;
use crate::document::plan::{DocumentPlan, PlanSection};
use crate::orchestration::result::ExecutionSummary;
use crate::review::entities::ReviewResult;
use crate::session::entities::Message;

/// Templates for generating prompts at each stage
pub struct DocumentPromptTemplate;

impl DocumentPromptTemplate {
    /// System prompt for request analysis
    pub fn analysis_system() -> &'static str {
        r#"You are an intelligent document assistant orchestrator. Analyze the user's request and determine:
1. Intent (create_document, modify_content, ask_question, conversation, general_assistance)
2. Action needed (plan, write, review, respond)
3. Confidence level (0.0-1.0)
4. Whether planning, writing and review are required

Requests that ask to write, create, draft, generate or make any document, template or text require writing.
Only complex multi-section documents require planning; templates and short content do not.
Any content creation requires review. Greetings and plain questions require none of these.

Respond with only a JSON object:
{"intent": "...", "action_needed": "...", "confidence": 0.0, "requires_planning": false, "requires_writing": false, "requires_review": false}"#
    }

    pub fn analysis(
        session: &str,
        plan_exists: bool,
        history_len: usize,
        user_message: &str,
    ) -> Vec<Message> {
        vec![
            Message::system(Self::analysis_system()),
            Message::user(format!(
                "Context:\nDocument: {session}\nCurrent plan exists: {plan_exists}\nConversation history length: {history_len}"
            )),
            Message::user(format!("User request: {user_message}")),
        ]
    }

    /// System prompt for plan creation
    pub fn planning_system() -> &'static str {
        r#"You are a strategic document planner. Create a detailed plan for the requested document.

Respond with a JSON object with:
- document_type: type of document (proposal, report, letter, ...)
- title: document title
- sections: array of {title, description, estimated_words, priority (high|medium|low)}
- estimated_time: total estimated time in seconds

Consider purpose, audience and logical flow."#
    }

    pub fn planning(user_request: &str, analysis: Option<&RequestAnalysis>) -> Vec<Message> {
        let (intent, confidence) = analysis
            .map(|a| (a.intent.as_str(), a.confidence))
            .unwrap_or(("unknown", 0.5));
        vec![
            Message::system(Self::planning_system()),
            Message::user(format!(
                "Context:\nUser intent: {intent}\nConfidence: {confidence:.2}"
            )),
            Message::user(format!("User request: {user_request}")),
        ]
    }

    pub fn plan_update(plan: &DocumentPlan, user_request: &str) -> Vec<Message> {
        let system = r#"You are updating an existing document plan. Apply the requested changes
and keep everything else. Respond with the complete updated plan as a JSON object using the
same fields: document_type, title, sections, estimated_time."#;
        vec![
            Message::system(system),
            Message::user(format!("Current plan: {}", plan_json(plan))),
            Message::user(format!("Update request: {user_request}")),
        ]
    }

    pub fn plan_improvements(plan: &DocumentPlan) -> Vec<Message> {
        let system = r#"Analyze the document plan and suggest improvements to content organization,
section completeness, logical flow and missing elements. Give one specific suggestion per line."#;
        vec![
            Message::system(system),
            Message::user(format!(
                "Plan: {}\nType: {}\nSections: {}\nProgress: {}/{}",
                plan.title,
                plan.document_type,
                plan.sections.len(),
                plan.current_step,
                plan.total_steps
            )),
        ]
    }

    /// System prompt for direct writing (no plan)
    pub fn writing_system() -> &'static str {
        r#"You are a skilled document writer. Produce well-structured, clear content that fulfils
the user's request. Use markdown headings where they help. Write the content only, without
commentary about what you are doing."#
    }

    pub fn write_direct(user_request: &str, recent: &[Message]) -> Vec<Message> {
        let conversation = recent
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");
        vec![
            Message::system(Self::writing_system()),
            Message::user(format!("Recent conversation: {conversation}")),
            Message::user(format!("Write content for: {user_request}")),
        ]
    }

    pub fn write_section(plan: &DocumentPlan, section: &PlanSection, user_request: &str) -> Vec<Message> {
        let system = format!(
            r#"You are writing one section of a {doc_type} titled "{title}".
Write the section "{section}" ({words} words, {priority} priority).
Section goal: {description}
Write only the body of this section, without repeating its heading."#,
            doc_type = plan.document_type,
            title = plan.title,
            section = section.title,
            words = section.estimated_words,
            priority = section.priority,
            description = if section.description.is_empty() {
                "not specified"
            } else {
                section.description.as_str()
            },
        );
        vec![
            Message::system(system),
            Message::user(format!(
                "Document context: sections are {}",
                plan.section_titles().join(", ")
            )),
            Message::user(format!("User request: {user_request}")),
        ]
    }

    pub fn expand(existing: &str, request: &str) -> Vec<Message> {
        let system = r#"Expand the existing content according to the request. Keep its tone and
structure, add depth and detail, and return the full expanded content."#;
        vec![
            Message::system(system),
            Message::user(format!("Existing content: {existing}")),
            Message::user(format!("Expansion request: {request}")),
        ]
    }

    pub fn rewrite(existing: &str, request: &str) -> Vec<Message> {
        let system = r#"Rewrite the content according to the request. Preserve the key information
and return only the rewritten content."#;
        vec![
            Message::system(system),
            Message::user(format!("Content to rewrite: {existing}")),
            Message::user(format!("Rewrite request: {request}")),
        ]
    }

    pub fn variation(content: &str, style: &str) -> Vec<Message> {
        vec![
            Message::system(format!(
                "Create a variation of the content that is {style}. Keep the core message."
            )),
            Message::user(format!("Content to vary: {content}")),
        ]
    }

    /// System prompt for content review
    pub fn review_system() -> &'static str {
        r#"You are a critical document reviewer. Evaluate the content for clarity, structure,
accuracy and completeness. Respond with:
Score: N/10
Feedback: your overall analysis
Suggestions: bullet points starting with "- "
Strengths: what works well"#
    }

    pub fn review(content: &str, plan: Option<&DocumentPlan>, user_request: &str) -> Vec<Message> {
        let plan_info = plan
            .map(|p| format!("Planned document: {} ({})", p.title, p.document_type))
            .unwrap_or_else(|| "No plan".to_string());
        vec![
            Message::system(Self::review_system()),
            Message::user(format!(
                "Context: {plan_info}\nOriginal request: {user_request}"
            )),
            Message::user(format!("Content to review: {content}")),
        ]
    }

    pub fn grammar_check(content: &str) -> Vec<Message> {
        let system = r#"Check the content for grammar, spelling and style problems. List each
issue on its own line, then list fixes as bullet points starting with "- "."#;
        vec![
            Message::system(system),
            Message::user(format!("Content to check: {content}")),
        ]
    }

    pub fn completeness(content: &str, plan: &DocumentPlan) -> Vec<Message> {
        let system = r#"Compare the content against the planned document structure. Are all
planned sections present, and is each one adequate? Provide a completeness score (Score: N/10)
and list any missing sections."#;
        vec![
            Message::system(system),
            Message::user(format!(
                "Plan: {}\nType: {}\nExpected sections: {}",
                plan.title,
                plan.document_type,
                plan.section_titles().join(", ")
            )),
            Message::user(format!("Content to assess: {content}")),
        ]
    }

    pub fn review_improvements(review: &ReviewResult, content: &str) -> Vec<Message> {
        let system = r#"Based on the review feedback, provide specific, actionable improvement
suggestions as a numbered or bulleted list. Focus on the most impactful changes."#;
        let excerpt: String = content.chars().take(500).collect();
        vec![
            Message::system(system),
            Message::user(format!(
                "Review score: {}\nAreas for improvement: {}\nFeedback: {}",
                review.score,
                review.areas_for_improvement.join("; "),
                review.feedback
            )),
            Message::user(format!("Content: {excerpt}...")),
        ]
    }

    /// System prompt for the final reply
    pub fn response_system() -> &'static str {
        r#"You are a helpful document assistant. Write a natural, conversational reply to the
user based on the work that has been completed. Be concise but informative. If content was
generated, mention what was produced (word count, sections)."#
    }

    pub fn final_response(
        summary: &ExecutionSummary,
        plan_exists: bool,
        user_request: &str,
    ) -> Vec<Message> {
        let intent = summary
            .intent
            .map(|i| i.as_str())
            .unwrap_or("unknown");
        let mut context = format!(
            "Intent: {intent}\nContent generated: {}\nContent reviewed: {}\nPreview updated: {}\nPlan exists: {plan_exists}",
            summary.content_generated, summary.content_reviewed, summary.preview_updated
        );
        if summary.document_updated {
            context.push_str(&format!(
                "\nDocument updated: {} words written",
                summary.words_written
            ));
            if summary.sections_completed > 0 {
                context.push_str(&format!(
                    ", {} sections completed",
                    summary.sections_completed
                ));
            }
        }
        if let Some(score) = summary.review_score {
            context.push_str(&format!("\nReview score: {score}/10"));
        }

        vec![
            Message::system(Self::response_system()),
            Message::user(format!("Context:\n{context}")),
            Message::user(format!("Original request: {user_request}")),
        ]
    }
}

fn plan_json(plan: &DocumentPlan) -> String {
    serde_json::json!({
        "document_type": plan.document_type,
        "title": plan.title,
        "sections": plan.sections,
        "estimated_time": plan.estimated_time,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::intent::Intent;
    use crate::session::entities::Role;

    #[test]
    fn test_analysis_prompt_ends_with_request() {
        let messages = DocumentPromptTemplate::analysis("doc-1", false, 0, "hi there");
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages.last().unwrap().content, "User request: hi there");
    }

    #[test]
    fn test_final_response_mentions_document_update() {
        let summary = ExecutionSummary {
            intent: Some(Intent::CreateDocument),
            content_generated: true,
            document_updated: true,
            words_written: 240,
            sections_completed: 2,
            ..Default::default()
        };
        let messages = DocumentPromptTemplate::final_response(&summary, true, "write it");
        assert!(messages[1].content.contains("Intent: create_document"));
        assert!(messages[1].content.contains("240 words written, 2 sections completed"));
        assert!(messages[1].content.contains("Plan exists: true"));
    }

    #[test]
    fn test_plan_update_embeds_current_plan() {
        let plan = crate::document::plan_parser::basic_plan();
        let messages = DocumentPromptTemplate::plan_update(&plan, "add a budget section");
        assert!(messages[1].content.contains("\"Main Content\""));
    }
}
