//! Groq chat-completion client (OpenAI compatible API)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{ChatMessage, LlmProvider};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_format: Option<&'a str>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
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
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Hosted chat-completion client with optional retry
pub struct GroqClient {
    /// HTTP client
    client: Client,
    /// API base URL without trailing slash
    base_url: String,
    /// Bearer token
    api_key: String,
    /// Configuration
    config: LlmConfig,
}

impl GroqClient {
    /// Create a new client; fails when no API key is configured
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            config: config.clone(),
        })
    }

    /// Retry transient failures with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < max_retries && e.is_transient() => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_completion(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            stream: false,
            reasoning_format: self.config.reasoning_format.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse completion response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::llm("Completion response contained no message"))
    }
}

/// Map an unsuccessful HTTP status to the matching error variant
fn error_for_status(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Authentication(format!("HTTP {} - {}", status.as_u16(), message))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            Error::RateLimited(format!("HTTP {} - {}", status.as_u16(), message))
        }
        _ => Error::llm(format!("Generation failed: HTTP {} - {}", status.as_u16(), message)),
    }
}

#[async_trait]
impl LlmProvider for GroqClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.config.model);
        self.retry_request(|| self.send_completion(messages)).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
