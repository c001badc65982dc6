//! Groq chat-completion client implementation

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use docqa_core::{
    ChatMessage, Error, GenerationConfig, GenerationResult, LLMProvider, Result, RetryConfig,
};

use crate::config::GroqConfig;
use crate::retry::with_retry;

/// "Please try again in 1m2.5s" / "try again in 450ms"
static TRY_AGAIN_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"try again in (?:(?P<min>\d+)m)?(?P<value>\d+(?:\.\d+)?)(?P<unit>ms|s)")
        .expect("valid retry-after pattern")
});

/// Groq client speaking the OpenAI-compatible chat completions API
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GroqClient {
    /// Model constants
    pub const LLAMA_3_1_70B_VERSATILE: &'static str = "llama-3.1-70b-versatile";
    pub const LLAMA_3_3_70B_VERSATILE: &'static str = "llama-3.3-70b-versatile";
    pub const LLAMA_3_1_8B_INSTANT: &'static str = "llama-3.1-8b-instant";

    /// Create a new Groq client from configuration
    ///
    /// Fails with [`Error::Configuration`] when the configuration is unusable,
    /// e.g. the API key is missing.
    pub fn new(config: GroqConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            retry: RetryConfig::default(),
        })
    }

    /// Create a new Groq client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = GroqConfig::from_env()?;
        Self::new(config)
    }

    /// Per-request timeout from `GROQ_TIMEOUT_SECS`
    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// Set the default model used when a request does not name one
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.config.model = model_id.into();
        self
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        config: &'a GenerationConfig,
    ) -> ChatCompletionRequest<'a> {
        let model = if config.model_id.is_empty() {
            self.config.model.as_str()
        } else {
            config.model_id.as_str()
        };

        ChatCompletionRequest {
            model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: false,
        }
    }

    /// Perform a single completion request
    async fn perform_completion(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let request = self.build_request(messages, config);
        let url = self.config.completions_url();

        debug!(url = %url, model = request.model, messages = messages.len(), "Sending Groq completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_http_error(status, retry_after.as_deref(), &body));
        }

        parse_response(&body, request.model)
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

/// Extract the completion text from a successful response body
fn parse_response(body: &str, requested_model: &str) -> Result<GenerationResult> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::llm(format!("Malformed completion response: {}", e)))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::llm("Completion response contained no message content"))?;

    Ok(GenerationResult {
        text,
        model_id: response.model.unwrap_or_else(|| requested_model.to_string()),
        tokens_used: response.usage.map(|usage| usage.total_tokens),
    })
}

/// Translate a non-success HTTP response into an [`Error`]
fn map_http_error(status: StatusCode, retry_after: Option<&str>, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Authentication(format!("Groq rejected the request ({}): {}", status, message))
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after: parse_retry_after(retry_after, &message),
        },
        status if status.is_server_error() => Error::LLMProvider {
            message: format!("Groq server error {}: {}", status, message),
            transient: true,
        },
        status => Error::llm(format!(
            "Groq API request failed with status {}: {}",
            status, message
        )),
    }
}

/// Delay requested by the server, from the `Retry-After` header or the error text
fn parse_retry_after(header: Option<&str>, message: &str) -> Option<Duration> {
    if let Some(secs) = header.and_then(|value| value.trim().parse::<f64>().ok()) {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let captures = TRY_AGAIN_IN.captures(message)?;
    let minutes: f64 = captures
        .name("min")
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    let value: f64 = captures.name("value")?.as_str().parse().ok()?;
    let seconds = match captures.name("unit").map(|m| m.as_str()) {
        Some("ms") => value / 1000.0,
        _ => value,
    };

    Duration::try_from_secs_f64(minutes * 60.0 + seconds).ok()
}

#[async_trait]
impl LLMProvider for GroqClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        with_retry(&self.retry, "groq.complete", move || async move {
            match timeout(config.timeout, self.perform_completion(messages, config)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "No response from Groq within {}s",
                    config.timeout.as_secs()
                ))),
            }
        })
        .await
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::PipelineConfig;
    use serde_json::json;

    fn client() -> GroqClient {
        GroqClient::new(GroqConfig::new("gsk_test")).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_key() {
        let result = GroqClient::new(GroqConfig::new(""));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_configured_timeout_reaches_pipeline_requests() {
        let config = GroqConfig {
            timeout_secs: 120,
            ..GroqConfig::new("gsk_test")
        };
        let client = GroqClient::new(config).unwrap();

        let pipeline = PipelineConfig {
            timeout: client.timeout(),
            ..Default::default()
        };

        assert_eq!(client.timeout(), Duration::from_secs(120));
        assert_eq!(pipeline.generation_config().timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_request_body_is_deterministic() {
        let client = client();
        let messages = vec![ChatMessage::user("What is the refund policy?")];
        let config = GenerationConfig::default();

        let body = serde_json::to_value(client.build_request(&messages, &config)).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "llama-3.1-70b-versatile",
                "messages": [{"role": "user", "content": "What is the refund policy?"}],
                "temperature": 0.0,
                "stream": false,
            })
        );
    }

    #[test]
    fn test_request_falls_back_to_client_model() {
        let client = client().with_model(GroqClient::LLAMA_3_1_8B_INSTANT);
        let messages = vec![ChatMessage::user("hi")];
        let config = GenerationConfig {
            model_id: String::new(),
            max_tokens: Some(16),
            ..Default::default()
        };

        let request = client.build_request(&messages, &config);
        assert_eq!(request.model, "llama-3.1-8b-instant");
        assert_eq!(request.max_tokens, Some(16));
        assert_eq!(client.model_id(), "llama-3.1-8b-instant");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "model": "llama-3.1-70b-versatile",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "YES"}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 1, "total_tokens": 41}
        }"#;

        let result = parse_response(body, "requested").unwrap();
        assert_eq!(result.text, "YES");
        assert_eq!(result.model_id, "llama-3.1-70b-versatile");
        assert_eq!(result.tokens_used, Some(41));
    }

    #[test]
    fn test_parse_response_without_content() {
        let err = parse_response(r#"{"choices": []}"#, "m").unwrap_err();
        assert!(matches!(err, Error::LLMProvider { transient: false, .. }));

        let err = parse_response("<html>bad gateway</html>", "m").unwrap_err();
        assert!(matches!(err, Error::LLMProvider { .. }));
    }

    #[test]
    fn test_map_http_error() {
        let unauthorized = map_http_error(
            StatusCode::UNAUTHORIZED,
            None,
            r#"{"error": {"message": "Invalid API Key"}}"#,
        );
        assert!(matches!(unauthorized, Error::Authentication(ref m) if m.contains("Invalid API Key")));

        let limited = map_http_error(StatusCode::TOO_MANY_REQUESTS, Some("3"), "{}");
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
        assert!(limited.is_transient());

        let overloaded = map_http_error(StatusCode::SERVICE_UNAVAILABLE, None, "overloaded");
        assert!(overloaded.is_transient());

        let bad_request = map_http_error(StatusCode::BAD_REQUEST, None, "model not found");
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn test_parse_retry_after_from_message() {
        let message = "Rate limit reached for model `llama-3.1-70b-versatile`. Please try again in 1m2.5s.";
        assert_eq!(parse_retry_after(None, message), Some(Duration::from_millis(62_500)));

        assert_eq!(
            parse_retry_after(None, "Please try again in 450ms"),
            Some(Duration::from_millis(450))
        );
        assert_eq!(parse_retry_after(None, "slow down"), None);
        assert_eq!(
            parse_retry_after(Some("2"), "Please try again in 9s"),
            Some(Duration::from_secs(2))
        );
    }
}
