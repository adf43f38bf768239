//! Provider configuration from TOML (`[providers]` section)

use serde::{Deserialize, Serialize};

/// The inline key if set, else the named environment variable. Blank values
/// count as missing.
fn resolve_key(inline: Option<&str>, env_name: &str) -> Option<String> {
    inline
        .map(str::to_string)
        .or_else(|| std::env::var(env_name).ok())
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    pub api_key: Option<String>,
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

impl FileOpenAiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Anthropic Claude API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileClaudeConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileClaudeConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 2000,
            api_version: "2023-06-01".to_string(),
        }
    }
}

impl FileClaudeConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Google Gemini (Generative Language API) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGoogleConfig {
    /// Environment variable name for the API key (default: "GOOGLE_API_KEY").
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for FileGoogleConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GOOGLE_API_KEY".to_string(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

impl FileGoogleConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileOpenAiConfig,
    pub claude: FileClaudeConfig,
    pub google: FileGoogleConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_key_wins() {
        let config = FileOpenAiConfig {
            api_key: Some("  sk-inline ".to_string()),
            api_key_env: "DOCUFORGE_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = FileClaudeConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_missing_env_is_missing() {
        let config = FileGoogleConfig {
            api_key_env: "DOCUFORGE_TEST_SURELY_UNSET".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_partial_table_keeps_vendor_defaults() {
        let toml_str = r#"
[claude]
max_tokens = 4096
"#;
        let config: FileProvidersConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.claude.max_tokens, 4096);
        assert_eq!(config.claude.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.claude.api_version, "2023-06-01");
        assert_eq!(config.google, FileGoogleConfig::default());
    }
}
