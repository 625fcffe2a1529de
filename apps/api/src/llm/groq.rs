//! Groq-backed provider over the OpenAI-compatible chat-completions API.
//!
//! Groq's free tier is tightly limited (30 requests/min, 6000 tokens/min),
//! so this provider consults a local sliding-window budget before every call
//! to preempt vendor-side throttling, and trips the limiter's circuit
//! breaker whenever the vendor does return 429.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::rate_limit::{Budget, RateLimitConfig, SlidingWindowLimiter};
use super::retry::{call_with_retry, FailureClass, RetryPolicy, VendorFailure};
use super::{parse_json_response, GenerationOptions, LlmError, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
const ATTEMPT_TIMEOUT_SECS: u64 = 60;
const CIRCUIT_COOLDOWN: Duration = Duration::from_secs(60);
/// Output-length buffer added to every token estimate.
const OUTPUT_TOKEN_BUFFER: u32 = 500;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'static str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Rough token estimate: ~4 chars per token for the Llama 3 tokenizer, plus
/// a fixed buffer for the response.
fn estimate_tokens(text: &str) -> u32 {
    (text.len() as u32).div_ceil(4) + OUTPUT_TOKEN_BUFFER
}

fn classify_groq(failure: &VendorFailure) -> FailureClass {
    if failure.message.contains("insufficient_quota") {
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
pub struct GroqProvider {
    http: Client,
    api_key: String,
    base_url: String,
    limiter: SlidingWindowLimiter,
    /// When true, an exhausted local budget blocks until the window frees
    /// instead of failing fast.
    wait_for_capacity: bool,
    retry_policy: RetryPolicy,
}

impl GroqProvider {
    pub fn new(api_key: String, wait_for_capacity: bool) -> Result<Self, LlmError> {
        Self::with_limits(api_key, wait_for_capacity, RateLimitConfig::groq_free_tier())
    }

    pub fn with_limits(
        api_key: String,
        wait_for_capacity: bool,
        limits: RateLimitConfig,
    ) -> Result<Self, LlmError> {
        if api_key.is_empty() {
            return Err(LlmError::Configuration(
                "GROQ_API_KEY is not set".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(ATTEMPT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            limiter: SlidingWindowLimiter::new(limits),
            wait_for_capacity,
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

    async fn acquire_budget(&self, estimated_tokens: u32) -> Result<(), LlmError> {
        loop {
            match self.limiter.check(estimated_tokens) {
                Budget::Allowed => return Ok(()),
                Budget::Wait(hint) if self.wait_for_capacity => {
                    debug!(wait_ms = hint.as_millis() as u64, "waiting for local budget");
                    tokio::time::sleep(hint.max(Duration::from_millis(50))).await;
                }
                Budget::Wait(hint) => {
                    return Err(LlmError::Provider {
                        attempts: 0,
                        message: format!(
                            "local rate limit budget exhausted (retry in ~{}ms)",
                            hint.as_millis()
                        ),
                    });
                }
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let system = options.system_prompt.as_deref();
        let estimated =
            estimate_tokens(prompt) + system.map(estimate_tokens).unwrap_or(0);
        self.acquire_budget(estimated).await?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatCompletionRequest {
            model: MODEL,
            messages,
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_completion_tokens: options
                .max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let policy = match options.retries {
            Some(n) => self.retry_policy.with_max_retries(n),
            None => self.retry_policy,
        };

        let (text, total_tokens) = call_with_retry("groq", policy, classify_groq, |_attempt| {
            let url = url.clone();
            let body = &body;
            async move {
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| VendorFailure::new(None, e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    if status.as_u16() == 429 {
                        self.limiter.trip(CIRCUIT_COOLDOWN);
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(VendorFailure::new(Some(status.as_u16()), body));
                }

                let parsed: ChatCompletionResponse = response
                    .json()
                    .await
                    .map_err(|e| VendorFailure::new(None, format!("malformed response: {e}")))?;

                let usage = parsed.usage.as_ref().map(|u| u.total_tokens);
                let content = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| VendorFailure::new(None, "response contained no content"))?;
                Ok((content, usage))
            }
        })
        .await?;

        self.limiter.record(total_tokens.unwrap_or(estimated));
        debug!(chars = text.len(), tokens = total_tokens, "groq call succeeded");
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
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
        let text = self.generate(prompt, options, true).await?;
        parse_json_response(&text)
    }

    fn provider_name(&self) -> &'static str {
        "groq"
    }
}
