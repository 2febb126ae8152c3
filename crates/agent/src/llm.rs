//! Language-model transport and the retry primitive wrapped around it.
//!
//! Every provider is reached through an OpenAI-compatible chat-completions
//! endpoint, so one HTTP client covers all three. Rate-limit rejections are
//! the only transient failure class; everything else surfaces immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use foafrag_core::config::{LlmConfig, LlmProvider};
use foafrag_core::errors::PipelineError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    /// The provider refused the call because of quota pressure. Retryable.
    #[error("language model rate limited: {0}")]
    RateLimited(String),
    /// Any other completion failure. Not retryable.
    #[error("language model call failed: {0}")]
    Failed(String),
}

/// One blocking-point for text completion. Implementations must be cheap to
/// clone behind the generation client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Injected delay source so retry timing is observable in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Chat-completions client for OpenAI, Gemini's compatibility endpoint, and
/// Ollama.
#[derive(Clone)]
pub struct HttpLlmClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

fn provider_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "https://api.openai.com/v1",
        LlmProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        LlmProvider::Ollama => "http://localhost:11434/v1",
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| LlmError::Failed(format!("http client setup failed: {error}")))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| provider_base_url(config.provider).to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
        })
    }
}

/// Providers disagree on how quota pressure is reported, so both the HTTP
/// status and the body text are inspected.
fn is_rate_limit_signal(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("429")
        || body.contains("RESOURCE_EXHAUSTED")
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        }));
        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|error| LlmError::Failed(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_rate_limit_signal(status, &body) {
                return Err(LlmError::RateLimited(format!("{status}: {}", body.trim())));
            }
            return Err(LlmError::Failed(format!("{status}: {}", body.trim())));
        }

        let completion = response
            .json::<CompletionResponse>()
            .await
            .map_err(|error| LlmError::Failed(format!("invalid completion response: {error}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Failed("completion response had no choices".to_string()))
    }
}

/// Wraps a model client with bounded retry on rate-limit failures only.
/// Delays start at the configured base and double each attempt.
pub struct GenerationClient<C, S = TokioSleeper> {
    llm: C,
    sleeper: S,
    max_retries: u32,
    base_delay: Duration,
}

impl<C> GenerationClient<C, TokioSleeper>
where
    C: LlmClient,
{
    pub fn from_config(llm: C, config: &LlmConfig) -> Self {
        Self::new(
            llm,
            TokioSleeper,
            config.max_retries,
            Duration::from_secs(config.retry_base_delay_secs.max(1)),
        )
    }
}

impl<C, S> GenerationClient<C, S>
where
    C: LlmClient,
    S: Sleeper,
{
    pub fn new(llm: C, sleeper: S, max_retries: u32, base_delay: Duration) -> Self {
        Self { llm, sleeper, max_retries, base_delay }
    }

    pub async fn invoke(&self, system: &str, user: &str) -> Result<String, PipelineError> {
        let total_attempts = self.max_retries + 1;
        for attempt in 1..=total_attempts {
            match self.llm.complete(system, user).await {
                Ok(text) => {
                    if attempt > 1 {
                        info!(
                            event_name = "llm.retry_recovered",
                            attempt,
                            "completion succeeded after rate-limit retries"
                        );
                    }
                    return Ok(text);
                }
                Err(LlmError::RateLimited(detail)) if attempt < total_attempts => {
                    let delay = self.base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        event_name = "llm.rate_limited",
                        attempt,
                        delay_secs = delay.as_secs(),
                        detail = %detail,
                        "rate limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(LlmError::RateLimited(_)) => {
                    return Err(PipelineError::RateLimitExceeded { attempts: total_attempts });
                }
                Err(LlmError::Failed(detail)) => {
                    return Err(PipelineError::Generation(detail));
                }
            }
        }
        Err(PipelineError::RateLimitExceeded { attempts: total_attempts })
    }
}
