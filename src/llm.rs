//! Generation backend abstraction
//!
//! Provides a common interface for requesting generated text from an
//! OpenAI-compatible chat-completions endpoint, whole-response or streamed.

mod client;
mod error;

pub use client::OpenAiClient;
pub use error::{GenerationError, GenerationErrorKind};

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Incremental sequence of content fragments from a streaming call.
///
/// Ends on the backend's completion signal or transport close. A mid-stream
/// failure surfaces as one final `Err` item before the stream ends.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Per-call overrides for generation parameters. `None` falls back to the
/// configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Common interface for the text-generation backend
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Make a whole-response completion request
    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError>;

    /// Open a streaming completion request
    async fn stream(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<TokenStream, GenerationError>;

    /// Get the model name sent to the backend
    fn model_id(&self) -> &str;
}

/// Logging wrapper for generation clients
pub struct LoggingClient {
    inner: Arc<dyn GenerationClient>,
    model_id: String,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn GenerationClient>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl GenerationClient for LoggingClient {
    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(prompt, params).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    response_chars = text.len(),
                    "generation request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "generation request failed"
                );
            }
        }

        result
    }

    async fn stream(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<TokenStream, GenerationError> {
        let result = self.inner.stream(prompt, params).await;

        match &result {
            Ok(_) => {
                tracing::info!(model = %self.model_id, "generation stream opened");
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "generation stream failed to open"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
