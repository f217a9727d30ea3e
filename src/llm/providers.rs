//! HTTP backends for the supported LLM providers.
//!
//! - Gemini: `generateContent` REST API, authenticated with an API key
//! - Ollama: local `/api/chat` endpoint, non-streaming

use super::{ChatBackend, LlmError};
use crate::config::ModelConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// System prompt shared by both providers.
const SYSTEM_PROMPT: &str = "You are an expert technical writer and documentation reviewer. \
When asked for JSON, output only valid JSON with no explanations or markdown.";

/// Maps a transport error onto the provider-neutral error type.
fn map_send_error(e: reqwest::Error, timeout_seconds: u64, endpoint: &str) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(timeout_seconds)
    } else if e.is_connect() {
        LlmError::Connect(endpoint.to_string())
    } else {
        LlmError::Request(e)
    }
}

fn build_client(timeout_seconds: u64) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?)
}

// ============================================================================
// Ollama
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Backend for a local (or remote) Ollama server.
pub struct OllamaBackend {
    http_client: reqwest::Client,
    base_url: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OllamaBackend {
    pub fn new(config: &ModelConfig) -> Result<Self, LlmError> {
        Ok(Self {
            http_client: build_client(config.timeout_seconds)?,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn request_body(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_seconds, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "Ollama",
                status,
                body,
            });
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        let content = chat_response.message.content;

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse("Ollama returned no content".into()));
        }

        debug!("Ollama returned {} chars", content.len());
        Ok(content)
    }
}

// ============================================================================
// Gemini
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiSystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiTextPart>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct GeminiTextPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.as_ref()?.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Backend for Google's Gemini API.
pub struct GeminiBackend {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl GeminiBackend {
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            http_client: build_client(config.timeout_seconds)?,
            base_url: config.gemini_url.trim_end_matches('/').to_string(),
            api_key,
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }

    fn request_body(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiTextPart {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiTextPart {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_seconds, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "Gemini",
                status,
                body,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;

        match gemini_response.text() {
            Some(text) => {
                debug!("Gemini returned {} chars", text.len());
                Ok(text)
            }
            None => Err(LlmError::EmptyResponse(format!(
                "prompt feedback: {}",
                gemini_response
                    .prompt_feedback
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "none".to_string())
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gemini_endpoint_and_body() {
        let config = ModelConfig::default();
        let backend = GeminiBackend::new(&config, "key".to_string()).unwrap();

        assert!(backend
            .endpoint()
            .ends_with("/models/gemini-2.0-flash:generateContent"));

        let body = serde_json::to_value(backend.request_body("Analyze this")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze this");
        assert!(body["generationConfig"]["temperature"].is_number());
        assert!(body["systemInstruction"]["parts"][0]["text"].is_string());
    }

    #[test]
    fn test_gemini_response_text() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\": 1}"));

        let blocked: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(blocked.text().is_none());
    }

    #[test]
    fn test_ollama_request_body() {
        let mut config = ModelConfig::default();
        config.name = "llama3.2:latest".to_string();
        config.ollama_url = "http://localhost:11434/".to_string();
        let backend = OllamaBackend::new(&config).unwrap();

        assert_eq!(backend.base_url, "http://localhost:11434");

        let body = serde_json::to_value(backend.request_body("hi")).unwrap();
        assert_eq!(body["model"], "llama3.2:latest");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }
}
