//! LLM provider adapters
//!
//! One [`LlmProvider`] per vendor, collected into a [`ProviderRegistry`] by
//! [`build_registry`]. Vendors without credentials are skipped with a
//! warning; the mock provider is always available.

pub mod claude;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod pacing;
pub mod sse;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use crate::config::FileProvidersConfig;
use docuforge_application::{GatewayError, LlmProvider, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the registry from the `[providers]` section.
///
/// `pacing` is the delay between words for adapters that stream a complete
/// response word by word.
pub fn build_registry(config: &FileProvidersConfig, pacing: Duration) -> ProviderRegistry {
    let client = reqwest::Client::new();
    let mut registry = ProviderRegistry::new();

    register(
        &mut registry,
        "openai",
        OpenAiProvider::from_config(client.clone(), &config.openai),
    );
    register(
        &mut registry,
        "claude",
        ClaudeProvider::from_config(client.clone(), &config.claude, pacing),
    );
    register(
        &mut registry,
        "google",
        GeminiProvider::from_config(client, &config.google, pacing),
    );

    registry.register(Arc::new(MockProvider::new().with_pacing(pacing)));
    info!("Mock provider initialized");
    registry
}

fn register<P: LlmProvider + 'static>(
    registry: &mut ProviderRegistry,
    name: &str,
    provider: Result<P, GatewayError>,
) {
    match provider {
        Ok(provider) => {
            registry.register(Arc::new(provider));
            info!(provider = name, "Provider initialized");
        }
        Err(e) => warn!(provider = name, "Provider not available: {}", e),
    }
}

/// Map a transport failure.
pub(crate) fn http_error(vendor: &str, error: reqwest::Error) -> GatewayError {
    if error.is_connect() || error.is_timeout() {
        GatewayError::ConnectionError(format!("{vendor}: {error}"))
    } else {
        GatewayError::RequestFailed(format!("{vendor}: {error}"))
    }
}

/// Turn a non-success response into an error carrying its body.
pub(crate) async fn status_error(vendor: &str, response: reqwest::Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!("{} API error {}: {}", vendor, status, body);
    GatewayError::RequestFailed(format!("{vendor} API error {status}: {body}"))
}
