//! Language-model endpoint abstraction.
//!
//! The model is a string-in/string-out dependency: one user-role prompt and
//! a temperature go in, one completion comes out. Nothing it returns is
//! trusted until it has been sanitized and validated by the translator.
//!
//! - **[`DisabledModel`]**: always fails; used when `[llm] provider = "disabled"`.
//! - **[`OpenAiCompatibleModel`]**: calls `POST {base_url}/chat/completions`
//!   on any OpenAI-compatible server (OpenAI, LM Studio, Ollama, vLLM).
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! When retries are exhausted the last error is returned, which fails the
//! whole search request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::ModelInvocationError;

/// A chat-completion style language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;

    /// Send `prompt` as a single user message and return the completion text.
    async fn complete(&self, prompt: &str, temperature: f32)
        -> Result<String, ModelInvocationError>;
}

// ============ Disabled Model ============

/// A model that refuses every request.
pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, ModelInvocationError> {
        Err(ModelInvocationError::Disabled)
    }
}

// ============ OpenAI-compatible Model ============

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiCompatibleModel {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl OpenAiCompatibleModel {
    /// Build a client from `[llm]` configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is missing, if `api_key_env` names an
    /// unset variable, or if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for openai provider"))?;

        let api_key = match &config.api_key_env {
            Some(var) => Some(
                std::env::var(var).map_err(|_| ModelInvocationError::MissingApiKey(var.clone()))?,
            ),
            None => None,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            max_retries: config.max_retries,
        })
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, Attempt> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Attempt::Retry(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let err = ModelInvocationError::Status {
                status: status.as_u16(),
                body: body_text,
            };
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(Attempt::Retry(err))
            } else {
                Err(Attempt::Fatal(err))
            };
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(ModelInvocationError::InvalidResponse(e.to_string())))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                Attempt::Fatal(ModelInvocationError::InvalidResponse(
                    "response has no completion content".into(),
                ))
            })
    }
}

/// Outcome of a failed attempt: whether another attempt may help.
enum Attempt {
    Retry(ModelInvocationError),
    Fatal(ModelInvocationError),
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ModelInvocationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            debug!(model = %self.model, attempt, "chat completion request");

            match self.send_once(&body).await {
                Ok(text) => return Ok(text),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(e)) => {
                    warn!(model = %self.model, attempt, error = %e, "chat completion attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ModelInvocationError::Network("chat completion failed after retries".into())
        }))
    }
}

/// Create the configured [`LanguageModel`].
///
/// | Config Value | Model |
/// |-------------|-------|
/// | `"disabled"` | [`DisabledModel`] |
/// | `"openai"` | [`OpenAiCompatibleModel`] |
pub fn create_model(config: &LlmConfig) -> anyhow::Result<Box<dyn LanguageModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledModel)),
        "openai" => Ok(Box::new(OpenAiCompatibleModel::new(config)?)),
        other => anyhow::bail!("Unknown llm provider: {}", other),
    }
}
