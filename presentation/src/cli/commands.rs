//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for docuforge
#[derive(Parser, Debug)]
#[command(name = "docuforge")]
#[command(author, version, about = "Multi-agent document authoring with LLM planners, writers and reviewers")]
#[command(long_about = r#"
Docuforge turns a request into a document with a small team of LLM agents.

Each request goes through up to four steps:
1. Analyze: classify the request (conversation, new document, edit)
2. Plan: outline the document sections when planning is needed
3. Write: generate content and save it to the session's document
4. Review: score the content and suggest improvements

Configuration files are loaded from (in priority order):
1. DOCUFORGE_* environment variables
2. --config <path>        Explicit config file
3. ./docuforge.toml       Project-level config
4. ~/.config/docuforge/config.toml   Global config

Example:
  docuforge "Write a short proposal template"
  docuforge --session q3-report --stream "Draft the executive summary"
  docuforge --chat --session notes
"#)]
pub struct Cli {
    /// The request to process (not required in chat mode)
    pub message: Option<String>,

    /// Document session to work in
    #[arg(short, long, value_name = "ID", default_value = "default")]
    pub session: String,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Print the final reply word by word as it arrives
    #[arg(long)]
    pub stream: bool,

    /// Print the full orchestration result as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print the session state after processing
    #[arg(long)]
    pub show_state: bool,
}

impl Cli {
    /// Default tracing filter for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
