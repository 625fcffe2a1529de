//! LLM Provider Abstraction Layer, the single point of entry for all LLM
//! calls in HRprep.
//!
//! ARCHITECTURAL RULE: No other module may call a vendor API directly.
//! Domain services see only `dyn LlmProvider`; which backend is active is
//! decided once by the factory from configuration.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod factory;
pub mod gemini;
pub mod groq;
pub mod rate_limit;
pub mod retry;

/// Per-call generation options. Immutable once passed in; providers read,
/// never mutate.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Sampling temperature. Provider default when `None`.
    pub temperature: Option<f32>,
    /// Cap on response length in tokens.
    pub max_output_tokens: Option<u32>,
    /// System/instruction turn, sent separately from the user prompt where
    /// the vendor supports it.
    pub system_prompt: Option<String>,
    /// Advisory structural hint for JSON generation. Gemini forwards it as
    /// `responseSchema`; Groq's JSON mode has no schema parameter and
    /// ignores it. Never enforced locally.
    pub json_schema: Option<Value>,
    /// Override of the provider's retry budget for this call.
    pub retries: Option<u32>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn with_max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = Some(n);
        self
    }

    pub fn with_system_prompt(mut self, s: impl Into<String>) -> Self {
        self.system_prompt = Some(s.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// Unknown provider selection or missing credential. Fatal at startup or
    /// first use.
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    /// Vendor call failed after exhausting the retry policy, or fatally on a
    /// non-retryable class (auth failure, zero-quota key, local budget
    /// exhausted in fail-fast mode).
    #[error("LLM provider error after {attempts} attempt(s): {message}")]
    Provider { attempts: u32, message: String },

    /// The vendor responded, but the text could not be interpreted as the
    /// expected JSON shape. Not retried: the content was generated, and
    /// re-prompting is a caller decision.
    #[error("failed to parse LLM response as JSON: {reason}")]
    Parse { reason: String, raw: String },
}

/// Capability contract every LLM backend satisfies.
#[async_trait]
pub trait LlmProvider: std::fmt::Debug + Send + Sync {
    /// Raw text completion.
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError>;

    /// Structured completion. The provider requests the vendor's JSON mode
    /// where available and always passes the response through
    /// [`extract_json`] before parsing, since models occasionally wrap JSON
    /// in fences or prose even in JSON mode.
    async fn generate_json(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Value, LlmError>;

    /// Static identifier, e.g. `"gemini"` or `"groq"`.
    fn provider_name(&self) -> &'static str;
}

/// Calls `generate_json` and deserializes into `T`.
/// A shape mismatch is a `Parse` error carrying the raw value for logging.
pub async fn generate_json_as<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<T, LlmError> {
    let value = provider.generate_json(prompt, options).await?;
    let raw = value.to_string();
    serde_json::from_value(value).map_err(|e| LlmError::Parse {
        reason: e.to_string(),
        raw,
    })
}

/// Extracts the JSON payload from raw model output.
///
/// Tolerates ```json fences, bare ``` fences, and surrounding prose
/// ("Here is the JSON you asked for: {...}"). Returns the input unchanged
/// when no wrapping is detected.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    {
        let inner = stripped.trim_start();
        return inner
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(inner);
    }

    // Prose-wrapped: take the outermost object or array.
    let object = text.find('{').zip(text.rfind('}'));
    let array = text.find('[').zip(text.rfind(']'));
    let span = match (object, array) {
        (Some(o), Some(a)) => Some(if o.0 < a.0 { o } else { a }),
        (Some(o), None) => Some(o),
        (None, Some(a)) => Some(a),
        (None, None) => None,
    };

    match span {
        Some((start, end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parses model output into a JSON value, stripping wrapping first.
pub fn parse_json_response(text: &str) -> Result<Value, LlmError> {
    let cleaned = extract_json(text);
    serde_json::from_str(cleaned).map_err(|e| LlmError::Parse {
        reason: e.to_string(),
        raw: text.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stub provider for domain-service tests. Vendor clients are an opaque
    //! dependency, so services are exercised against canned responses.

    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug)]
    pub struct StubProvider {
        response: Result<Value, String>,
        pub calls: AtomicU32,
    }

    impl StubProvider {
        pub fn json(value: Value) -> Self {
            Self {
                response: Ok(value),
                calls: AtomicU32::new(0),
            }
        }

        pub fn text(s: &str) -> Self {
            Self::json(Value::String(s.to_string()))
        }

        pub fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                calls: AtomicU32::new(0),
            }
        }

        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn generate_text(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(Value::String(s)) => Ok(s.clone()),
                Ok(v) => Ok(v.to_string()),
                Err(m) => Err(LlmError::Provider {
                    attempts: 1,
                    message: m.clone(),
                }),
            }
        }

        async fn generate_json(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Value, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(v) => Ok(v.clone()),
                Err(m) => Err(LlmError::Provider {
                    attempts: 1,
                    message: m.clone(),
                }),
            }
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }
}
