//! Gemini-backed provider over the `generateContent` REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::retry::{call_with_retry, FailureClass, RetryPolicy, VendorFailure};
use super::{parse_json_response, GenerationOptions, LlmError, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
const ATTEMPT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content.parts;
        if parts.is_empty() {
            return None;
        }
        Some(
            parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .concat(),
        )
    }
}

/// Zero-quota vs. transient classification for Gemini.
///
/// AI Studio keys report plain 429s when momentarily rate-limited; a Vertex
/// key (or an exhausted account) reports a quota failure whose detail carries
/// `limit: 0`. The latter can never succeed on retry.
fn classify_gemini(failure: &VendorFailure) -> FailureClass {
    let msg = failure.message.as_str();
    if msg.contains("quota") && msg.contains("limit: 0") {
        return FailureClass::ZeroQuota;
    }
    match failure.status {
        Some(429) => FailureClass::Transient,
        Some(s) if s >= 500 => FailureClass::Transient,
        None => FailureClass::Transient, // connect/timeout
        _ => FailureClass::Fatal,
    }
}

#[derive(Debug)]
pub struct GeminiProvider {
    http: Client,
    api_key: String,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        if api_key.is_empty() {
            return Err(LlmError::Configuration(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(ATTEMPT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_policy: RetryPolicy::default(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[cfg(test)]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: options.system_prompt.as_deref().map(|s| Content {
                parts: vec![Part { text: s }],
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: options
                    .max_output_tokens
                    .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
                response_mime_type: json_mode.then_some("application/json"),
                response_schema: if json_mode {
                    options.json_schema.clone()
                } else {
                    None
                },
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, MODEL, self.api_key
        );

        let policy = match options.retries {
            Some(n) => self.retry_policy.with_max_retries(n),
            None => self.retry_policy,
        };

        let text = call_with_retry("gemini", policy, classify_gemini, |_attempt| {
            let url = url.clone();
            let body = &body;
            async move {
                let response = self
                    .http
                    .post(&url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| VendorFailure::new(None, e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(VendorFailure::new(Some(status.as_u16()), body));
                }

                let parsed: GenerateContentResponse = response
                    .json()
                    .await
                    .map_err(|e| VendorFailure::new(None, format!("malformed response: {e}")))?;

                parsed
                    .text()
                    .ok_or_else(|| VendorFailure::new(None, "response contained no candidate text"))
            }
        })
        .await?;

        debug!(chars = text.len(), "gemini call succeeded");
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        self.generate(prompt, options, false).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Value, LlmError> {
        // Native JSON mode, but models still occasionally add fences.
        let text = self.generate(prompt, options, true).await?;
        parse_json_response(&text)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
