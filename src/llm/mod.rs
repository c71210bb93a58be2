//! LLM integration for the Destiny Engine.
//!
//! Backed by rig-core providers:
//! - **Groq**: the default
//! - **OpenAI**

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;
use std::time::Duration;

use rig::client::CompletionClient;
use rig::providers::{groq, openai};
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Groq,
    OpenAi,
}

impl LlmBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown LLM backend '{other}' (expected groq or openai)")),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: Option<secrecy::SecretString>,
    pub model: String,
    pub timeout: Duration,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let api_key = config
        .api_key
        .as_ref()
        .ok_or_else(|| LlmError::NotConfigured {
            provider: config.backend.name().to_string(),
        })?;
    let provider = config.backend.name();
    let client_error = |e: &dyn std::fmt::Display| LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: format!("Failed to create {provider} client: {e}"),
    };

    match config.backend {
        LlmBackend::Groq => {
            let client: groq::Client =
                groq::Client::new(api_key.expose_secret()).map_err(|e| client_error(&e))?;
            let model = client.completion_model(&config.model);
            tracing::info!("Using Groq (model: {})", config.model);
            Ok(Arc::new(RigAdapter::new(
                model,
                &config.model,
                provider,
                config.timeout,
            )))
        }
        LlmBackend::OpenAi => {
            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(api_key.expose_secret()).map_err(|e| client_error(&e))?;
            let model = client.completion_model(&config.model);
            tracing::info!("Using OpenAI (model: {})", config.model);
            Ok(Arc::new(RigAdapter::new(
                model,
                &config.model,
                provider,
                config.timeout,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            backend: LlmBackend::Groq,
            api_key: api_key.map(secrecy::SecretString::from),
            model: "llama-3.1-8b-instant".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_create_provider_with_key() {
        let provider = create_provider(&config(Some("gsk-test"))).unwrap();
        assert_eq!(provider.model_name(), "llama-3.1-8b-instant");
    }

    #[test]
    fn test_create_provider_without_key() {
        let err = create_provider(&config(None)).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured { .. }));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Groq".parse::<LlmBackend>().unwrap(), LlmBackend::Groq);
        assert_eq!("openai".parse::<LlmBackend>().unwrap(), LlmBackend::OpenAi);
        assert!("gemini".parse::<LlmBackend>().is_err());
    }
}
