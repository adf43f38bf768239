//! Output format value object

use serde::{Deserialize, Serialize};

/// How orchestration results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The reply text, followed by a short summary (default)
    #[default]
    Text,
    /// The full result object as JSON
    Json,
}
