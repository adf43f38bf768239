//! Configuration file loading for docuforge
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DOCUFORGE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./docuforge.toml` or `./.docuforge.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/docuforge/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileClaudeConfig, FileConfig, FileConfigError, FileGoogleConfig, FileLoggingConfig,
    FileOpenAiConfig, FileOutputConfig, FilePipelineConfig, FileProvidersConfig,
    FileStorageConfig,
};
pub use loader::{ConfigLoadError, ConfigLoader};
