//! Provider selection and construction.
//!
//! Exactly one provider is active per factory. Construction is lazy (first
//! `provider()` call) and memoized for the factory's lifetime. Configuration
//! is an explicit value handed to the constructor; the factory never reads
//! the environment itself, so tests can run several configurations in one
//! process.

use std::sync::{Arc, Mutex};

use tracing::info;

use super::gemini::GeminiProvider;
use super::groq::GroqProvider;
use super::{LlmError, LlmProvider};

/// Provider-selection settings, normally derived from [`crate::config::Config`].
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Backend name: `"gemini"` or `"groq"` (case-insensitive).
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// Groq only: block on an exhausted local budget instead of failing fast.
    pub groq_wait_for_capacity: bool,
}

pub struct LlmFactory {
    config: LlmConfig,
    instance: Mutex<Option<Arc<dyn LlmProvider>>>,
}

impl LlmFactory {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            instance: Mutex::new(None),
        }
    }

    /// Returns the active provider, constructing it on first call.
    ///
    /// An unrecognized provider name or missing credential fails with
    /// `LlmError::Configuration` before any vendor client is built.
    pub fn provider(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        let mut slot = self.instance.lock().unwrap();
        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let provider = self.build()?;
        info!(provider = provider.provider_name(), "LLM provider initialized");
        *slot = Some(Arc::clone(&provider));
        Ok(provider)
    }

    fn build(&self) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match self.config.provider.to_lowercase().as_str() {
            "gemini" => {
                let key = self.config.gemini_api_key.clone().ok_or_else(|| {
                    LlmError::Configuration(
                        "LLM_PROVIDER is 'gemini' but GEMINI_API_KEY is not set".to_string(),
                    )
                })?;
                Ok(Arc::new(GeminiProvider::new(key)?))
            }
            "groq" => {
                let key = self.config.groq_api_key.clone().ok_or_else(|| {
                    LlmError::Configuration(
                        "LLM_PROVIDER is 'groq' but GROQ_API_KEY is not set".to_string(),
                    )
                })?;
                Ok(Arc::new(GroqProvider::new(
                    key,
                    self.config.groq_wait_for_capacity,
                )?))
            }
            other => Err(LlmError::Configuration(format!(
                "unknown LLM_PROVIDER '{other}' (expected 'gemini' or 'groq')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemini_config() -> LlmConfig {
        LlmConfig {
            provider: "gemini".to_string(),
            gemini_api_key: Some("k".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_selects_gemini() {
        let factory = LlmFactory::new(gemini_config());
        assert_eq!(factory.provider().unwrap().provider_name(), "gemini");
    }

    #[test]
    fn test_selects_groq_case_insensitively() {
        let factory = LlmFactory::new(LlmConfig {
            provider: "GROQ".to_string(),
            groq_api_key: Some("k".to_string()),
            ..Default::default()
        });
        assert_eq!(factory.provider().unwrap().provider_name(), "groq");
    }

    #[test]
    fn test_memoizes_single_instance() {
        let factory = LlmFactory::new(gemini_config());
        let first = factory.provider().unwrap();
        let second = factory.provider().unwrap();
        assert_eq!(first.provider_name(), second.provider_name());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let factory = LlmFactory::new(LlmConfig {
            provider: "openai".to_string(),
            gemini_api_key: Some("k".to_string()),
            groq_api_key: Some("k".to_string()),
            ..Default::default()
        });
        match factory.provider().unwrap_err() {
            LlmError::Configuration(msg) => assert!(msg.contains("openai")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let factory = LlmFactory::new(LlmConfig {
            provider: "gemini".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            factory.provider().unwrap_err(),
            LlmError::Configuration(_)
        ));
    }
}
