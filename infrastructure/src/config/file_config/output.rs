//! Output, logging and storage configuration from TOML

use docuforge_domain::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw output configuration (`[output]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Show progress spinners while agents work
    pub show_progress: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
            show_progress: true,
        }
    }
}

/// Logging configuration (`[logging]` section)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of provider calls and pipeline events.
    pub conversation_log: Option<PathBuf>,
    /// Directory for daily-rolling diagnostic logs.
    pub dir: Option<PathBuf>,
}

/// Document storage configuration (`[storage]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub documents_dir: PathBuf,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("./documents"),
        }
    }
}
