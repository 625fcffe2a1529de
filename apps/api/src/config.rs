use anyhow::{bail, Context, Result};

use crate::llm::factory::LlmConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if the selected provider's credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_provider: String,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_wait_for_capacity: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            llm_provider: std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string()),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            groq_api_key: optional_env("GROQ_API_KEY"),
            groq_wait_for_capacity: std::env::var("GROQ_WAIT_FOR_CAPACITY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// The selected backend must have its credential present at startup;
    /// failing on the first request instead would hide a deployment mistake.
    fn validate(&self) -> Result<()> {
        match self.llm_provider.to_lowercase().as_str() {
            "gemini" if self.gemini_api_key.is_none() => {
                bail!("LLM_PROVIDER is 'gemini' but GEMINI_API_KEY is not set")
            }
            "groq" if self.groq_api_key.is_none() => {
                bail!("LLM_PROVIDER is 'groq' but GROQ_API_KEY is not set")
            }
            "gemini" | "groq" => Ok(()),
            other => bail!("unknown LLM_PROVIDER '{other}' (expected 'gemini' or 'groq')"),
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            provider: self.llm_provider.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
            groq_api_key: self.groq_api_key.clone(),
            groq_wait_for_capacity: self.groq_wait_for_capacity,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            llm_provider: "gemini".to_string(),
            gemini_api_key: Some("k".to_string()),
            groq_api_key: None,
            groq_wait_for_capacity: false,
            port: 3001,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_valid_gemini_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_selected_credential_fails() {
        let mut config = base_config();
        config.gemini_api_key = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_provider_fails() {
        let mut config = base_config();
        config.llm_provider = "claude".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_config_carries_selection() {
        let llm = base_config().llm_config();
        assert_eq!(llm.provider, "gemini");
        assert_eq!(llm.gemini_api_key.as_deref(), Some("k"));
    }
}
