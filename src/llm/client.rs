//! OpenAI-compatible chat-completions client

use super::{GenerationClient, GenerationError, GenerationParams, TokenStream};
use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const STREAM_CHANNEL_CAPACITY: usize = 32;

/// Client for an OpenAI-compatible `chat/completions` endpoint.
///
/// Endpoint, credentials, model and generation defaults are fixed at
/// construction. The optional system prompt is read once from disk; an
/// unreadable file degrades to no system prompt, while a missing base URL,
/// API key or model name fails construction outright.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("BOT_API__BASE_URL"));
        }
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("BOT_API__API_KEY"));
        }
        if config.model.trim().is_empty() {
            return Err(ConfigError::Missing("BOT_API__MODEL"));
        }

        let system_prompt = match &config.system_prompt_path {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "system prompt file unreadable, continuing without one"
                    );
                    String::new()
                }
            },
            None => String::new(),
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            system_prompt,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(&self, prompt: &str, params: GenerationParams, stream: bool) -> ChatRequest {
        let mut messages = Vec::new();
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: params.temperature.unwrap_or(self.temperature),
            max_tokens: params.max_tokens.unwrap_or(self.max_tokens),
            stream,
        }
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, GenerationError> {
        self.client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GenerationError::network(format!("Connection failed: {e}"))
                } else {
                    GenerationError::unknown(format!("Request failed: {e}"))
                }
            })
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError> {
        let request = self.build_request(prompt, params, false);
        let response = self.post(&request).await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        extract_content(&body)
    }

    async fn stream(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<TokenStream, GenerationError> {
        let request = self.build_request(prompt, params, true);
        let response = self.post(&request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut pending = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        // Surface one terminal error item; the consumer
                        // decides presentation.
                        let err = GenerationError::network(format!("Stream interrupted: {e}"));
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                };

                pending.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(newline) = pending.find('\n') {
                    let line: String = pending.drain(..=newline).collect();
                    match parse_stream_line(&line) {
                        StreamLine::Delta(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                // Consumer gone, stop reading.
                                return;
                            }
                        }
                        StreamLine::Done => return,
                        StreamLine::Skip => {}
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> GenerationError {
    if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(body) {
        let message = error_resp.error.message;
        return match status.as_u16() {
            401 | 403 => GenerationError::auth(format!("Authentication failed: {message}")),
            429 => GenerationError::rate_limit(format!("Rate limit exceeded: {message}")),
            400 => GenerationError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => GenerationError::server_error(format!("Server error: {message}")),
            _ => GenerationError::unknown(format!("HTTP {status}: {message}")),
        };
    }
    match status.as_u16() {
        401 | 403 => GenerationError::auth(format!("HTTP {status}")),
        429 => GenerationError::rate_limit(format!("HTTP {status}")),
        500..=599 => GenerationError::server_error(format!("HTTP {status}")),
        _ => GenerationError::unknown(format!("HTTP {status} error: {body}")),
    }
}

fn extract_content(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::format(format!("Failed to parse response: {e}")))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.is_empty() {
        return Err(GenerationError::format("No content in response"));
    }
    Ok(content)
}

/// Outcome of parsing one line of the SSE response body.
#[derive(Debug, PartialEq, Eq)]
enum StreamLine {
    /// A non-empty content increment
    Delta(String),
    /// End of stream: `[DONE]` sentinel or a finish reason
    Done,
    /// Comment, blank line, or undecodable chunk (skipped silently)
    Skip,
}

fn parse_stream_line(line: &str) -> StreamLine {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return StreamLine::Done;
    }

    let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
        return StreamLine::Skip;
    };
    let Some(choice) = chunk.choices.into_iter().next() else {
        return StreamLine::Skip;
    };

    match choice.delta.content {
        Some(text) if !text.is_empty() => StreamLine::Delta(text),
        _ if choice.finish_reason.is_some() => StreamLine::Done,
        _ => StreamLine::Skip,
    }
}

// Chat-completions API types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
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
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    content: Option<String>,
}
