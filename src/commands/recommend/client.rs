use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::http::build_client;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("{0}")]
    Rejected(String),
}

/// Something that turns a prompt into a completion.
pub trait CompletionClient {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
pub struct ChatCompletionsClient {
    client: Client,
    settings: ChatSettings,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl ChatCompletionsClient {
    pub fn new(api_key: &str, settings: ChatSettings, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY is empty");
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .context("api key is not a valid header value")?;
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self {
            client: build_client(timeout, headers)?,
            settings,
        })
    }
}

impl CompletionClient for ChatCompletionsClient {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .json(&request)
            .send()
            .map_err(|err| {
                if err.is_timeout() || err.is_connect() {
                    CompletionError::Api(format!("request failed: {err}"))
                } else {
                    CompletionError::Rejected(format!("request failed: {err}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => format!("{status}: {}", parsed.error.message),
                Err(_) => format!("{status}: {}", body.trim()),
            };
            debug!(status = status.as_u16(), "completion request rejected");
            return Err(match status.as_u16() {
                429 => CompletionError::RateLimited(message),
                500..=599 => CompletionError::Api(message),
                _ => CompletionError::Rejected(message),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|err| CompletionError::Rejected(format!("malformed completion: {err}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| CompletionError::Rejected("completion had no content".to_string()))
    }
}
