//! Groq configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use docqa_core::{DEFAULT_MODEL_ID, Error, Result};

/// Configuration for the Groq client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl GroqConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.groq.com/openai/v1";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Create configuration from `.env` and environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "GROQ_API_KEY not set. Check .env or environment variables.".to_string(),
                )
            })?;

        let api_url = lookup("GROQ_API_URL").unwrap_or_else(|| Self::DEFAULT_API_URL.to_string());
        let model = lookup("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let timeout_secs = match lookup("GROQ_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::Configuration(format!("GROQ_TIMEOUT_SECS must be a whole number, got '{}'", raw))
            })?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            api_key,
            api_url,
            model,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: Self::DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL_ID.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Check that the configuration can be used to build a client
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("Groq API key is empty".to_string()));
        }

        let url = url::Url::parse(&self.api_url).map_err(|e| {
            Error::Configuration(format!("Invalid GROQ_API_URL '{}': {}", self.api_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "GROQ_API_URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Configuration("Request timeout must be positive".to_string()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoint for chat completions
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}
