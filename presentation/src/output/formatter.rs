//! Output formatter trait

use docuforge_domain::{OrchestrationResult, OutputFormat};

/// Trait for formatting orchestration results
pub trait OutputFormatter {
    /// Human-readable reply with a one-line summary
    fn format(&self, result: &OrchestrationResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &OrchestrationResult) -> String;

    fn render(&self, result: &OrchestrationResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.format(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
