//! Language model access.
//!
//! The pipeline stages only see the [`LanguageModel`] trait. [`LlmService`]
//! implements it on top of a provider backend, owning the retry policy and
//! the cleanup of raw completions into structured JSON or plain text.

pub mod providers;

pub use providers::{GeminiBackend, OllamaBackend};

use crate::config::{ModelConfig, Provider};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while talking to an LLM provider.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not set (use --api-key, the environment, or a .env file)")]
    MissingApiKey,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to {0}. Is the service reachable?")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Empty or blocked response: {0}")]
    EmptyResponse(String),

    #[error("LLM query failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: usize, last: String },
}

/// A successful completion, decoded as far as possible.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// The completion parsed as JSON.
    Structured(Value),
    /// The completion did not parse; raw text as received.
    Text(String),
}

impl LlmResponse {
    /// Classifies a raw completion, stripping markdown code fences first.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str(strip_code_fences(raw)) {
            Ok(value) => LlmResponse::Structured(value),
            Err(_) => LlmResponse::Text(raw.to_string()),
        }
    }

    /// Returns the response as JSON, re-attempting a decode of raw text.
    pub fn decode_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            LlmResponse::Structured(value) => Ok(value.clone()),
            LlmResponse::Text(text) => serde_json::from_str(strip_code_fences(text)),
        }
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        let text = match self {
            LlmResponse::Structured(value) => value.to_string(),
            LlmResponse::Text(text) => text.clone(),
        };
        truncate_chars(&text, 200)
    }
}

/// Removes a surrounding ```json / ``` fence from an LLM completion.
pub fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Truncates to at most `max` characters, appending "..." when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// The query contract used by analyzers and pipeline stages.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs and report metadata.
    fn model_name(&self) -> &str;

    /// Sends one prompt. `Err` means the call failed after all retries.
    async fn query(&self, prompt: &str) -> Result<LlmResponse, LlmError>;
}

/// A provider endpoint that turns a prompt into raw completion text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn provider(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Fixed-delay retry policy for LLM calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&ModelConfig> for RetryPolicy {
    fn from(config: &ModelConfig) -> Self {
        Self {
            max_attempts: config.retries.max(1),
            delay: Duration::from_secs(config.retry_delay_seconds),
        }
    }
}

/// [`LanguageModel`] implementation with retries and response cleanup.
pub struct LlmService {
    backend: Box<dyn ChatBackend>,
    retry: RetryPolicy,
}

impl LlmService {
    pub fn new(backend: Box<dyn ChatBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Builds the service for the configured provider.
    pub fn from_config(config: &ModelConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        let backend: Box<dyn ChatBackend> = match config.provider {
            Provider::Gemini => {
                let key = api_key
                    .filter(|k| !k.trim().is_empty())
                    .ok_or(LlmError::MissingApiKey)?;
                Box::new(GeminiBackend::new(config, key)?)
            }
            Provider::Ollama => Box::new(OllamaBackend::new(config)?),
        };

        info!(
            "LLM service initialized with {} model {}",
            backend.provider(),
            backend.model()
        );

        Ok(Self::new(backend, RetryPolicy::from(config)))
    }

    pub fn provider(&self) -> &'static str {
        self.backend.provider()
    }
}

#[async_trait]
impl LanguageModel for LlmService {
    fn model_name(&self) -> &str {
        self.backend.model()
    }

    async fn query(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(
                "Sending prompt to LLM (attempt {}/{}, {} chars)",
                attempt,
                attempts,
                prompt.len()
            );

            match self.backend.complete(prompt).await {
                Ok(raw) => {
                    let response = LlmResponse::from_raw(&raw);
                    if matches!(response, LlmResponse::Text(_)) {
                        warn!("LLM response was not valid JSON, returning raw text");
                    }
                    return Ok(response);
                }
                Err(e) => {
                    warn!("Error querying LLM (attempt {}/{}): {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        info!("Retrying in {}s...", self.retry.delay.as_secs());
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

/// Scripted model used by the pipeline tests.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued outcomes in order and records every prompt.
    #[derive(Default)]
    pub struct ScriptedModel {
        responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_json(self, value: Value) -> Self {
            self.push(Ok(LlmResponse::Structured(value)))
        }

        pub fn with_text(self, text: &str) -> Self {
            self.push(Ok(LlmResponse::Text(text.to_string())))
        }

        pub fn with_failure(self) -> Self {
            self.push(Err(LlmError::RetriesExhausted {
                attempts: 3,
                last: "scripted failure".to_string(),
            }))
        }

        fn push(self, outcome: Result<LlmResponse, LlmError>) -> Self {
            self.responses.lock().unwrap().push_back(outcome);
            self
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn query(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::EmptyResponse("no scripted response".into())))
        }
    }
}
