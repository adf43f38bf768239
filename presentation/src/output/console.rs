//! Console output formatter for orchestration results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use docuforge_application::OrchestratorState;
use docuforge_domain::{ActivityRecord, ActivityStatus, OrchestrationResult};

/// Formats orchestration results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// The reply followed by a dimmed summary of what the agents did
    pub fn format(result: &OrchestrationResult) -> String {
        let mut output = String::new();

        if result.success {
            output.push_str(result.response.as_deref().unwrap_or_default());
            output.push_str("\n\n");
        } else {
            output.push_str(&format!(
                "{} {}\n\n",
                "Error:".red().bold(),
                result.error.as_deref().unwrap_or("Unknown")
            ));
        }

        output.push_str(&format!("{}\n", Self::summary_line(result).dimmed()));
        output
    }

    /// Format as JSON
    pub fn format_json(result: &OrchestrationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    fn summary_line(result: &OrchestrationResult) -> String {
        let summary = &result.summary;
        let mut parts = Vec::new();

        if let Some(intent) = &summary.intent {
            parts.push(format!("intent: {}", intent));
        }
        if summary.plan_updated {
            parts.push("plan updated".to_string());
        }
        if summary.content_generated {
            parts.push(format!(
                "{} words in {} sections",
                summary.words_written, summary.sections_completed
            ));
        }
        if summary.document_updated {
            parts.push("saved".to_string());
        }
        if let Some(score) = summary.review_score {
            parts.push(format!("review {}/10", score));
        }
        if result.preview_ready {
            parts.push("preview ready".to_string());
        }
        parts.push(format!("{:.1}s", result.processing_time));

        parts.join(" | ")
    }

    /// One line per activity, oldest first
    pub fn format_activity_log(records: &[ActivityRecord]) -> String {
        records
            .iter()
            .map(|record| {
                let mark = match record.status {
                    ActivityStatus::InProgress => "..".yellow(),
                    ActivityStatus::Completed => "v".green(),
                    ActivityStatus::Error => "x".red(),
                };
                format!("  {} [{}] {}", mark, record.agent, record.action)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Session state for `--show-state` and `/state`
    pub fn format_state(state: &OrchestratorState) -> String {
        let mut output = String::new();
        output.push_str(&Self::section_header(&format!("Session {}", state.session_id)));
        output.push_str(&format!("  state:     {}\n", state.snapshot.state));
        if let Some(agent) = &state.snapshot.current_agent {
            output.push_str(&format!("  agent:     {}\n", agent));
        }
        output.push_str(&format!("  messages:  {} pending\n", state.pending_messages));
        match &state.plan_progress {
            Some(progress) => output.push_str(&format!(
                "  plan:      step {}/{} ({:.0}%)\n",
                progress.current_step, progress.total_steps, progress.completion_percentage
            )),
            None => output.push_str("  plan:      none\n"),
        }
        output.push_str(&format!(
            "  providers: {}\n",
            state.available_providers.join(", ")
        ));
        output.push_str(&format!(
            "  writer:    {}/{}  (fallback {}/{})\n",
            state.config.writer_llm,
            state.config.writer_model,
            state.config.fallback_llm,
            state.config.fallback_model
        ));
        output
    }

    fn section_header(title: &str) -> String {
        format!("{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &OrchestrationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &OrchestrationResult) -> String {
        Self::format_json(result)
    }
}
