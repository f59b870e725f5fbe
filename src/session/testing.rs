//! Mock implementations for testing
//!
//! These mocks enable exercising the session controller without real I/O.

use super::traits::{ChatTransport, EditOutcome, MessageRef};
use crate::llm::{GenerationClient, GenerationError, GenerationParams, TokenStream};
use crate::telegram::TransportError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock Generation Client
// ============================================================================

/// Mock generation client that returns queued responses
pub struct MockGenerationClient {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    streams: Mutex<VecDeque<Vec<Result<String, GenerationError>>>>,
    /// Record of all prompts sent
    prompts: Mutex<Vec<String>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful whole-response payload
    pub fn queue_response(&self, payload: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(payload.to_string()));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: GenerationError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Queue the item sequence for one streaming call
    pub fn queue_stream(&self, items: Vec<Result<&str, GenerationError>>) {
        self.streams.lock().unwrap().push_back(
            items
                .into_iter()
                .map(|item| item.map(ToString::to_string))
                .collect(),
        );
    }

    /// Get recorded prompts
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of generation calls made (whole-response and streaming)
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn complete(
        &self,
        prompt: &str,
        _params: GenerationParams,
    ) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::network("No mock response queued")))
    }

    async fn stream(
        &self,
        prompt: &str,
        _params: GenerationParams,
    ) -> Result<TokenStream, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.streams.lock().unwrap().pop_front() {
            Some(items) => Ok(Box::pin(futures::stream::iter(items))),
            None => Err(GenerationError::network("No mock stream queued")),
        }
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Chat Transport
// ============================================================================

/// Mock transport recording replies and edits, with queueable edit outcomes
pub struct MockTransport {
    replies: Mutex<Vec<String>>,
    edits: Mutex<Vec<String>>,
    edit_outcomes: Mutex<VecDeque<Result<EditOutcome, TransportError>>>,
    next_message_id: AtomicI64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            edit_outcomes: Mutex::new(VecDeque::new()),
            next_message_id: AtomicI64::new(100),
        }
    }

    /// Queue the outcome of the next edit; unqueued edits succeed.
    pub fn queue_edit_outcome(&self, outcome: Result<EditOutcome, TransportError>) {
        self.edit_outcomes.lock().unwrap().push_back(outcome);
    }

    /// Texts sent as new messages, in order
    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }

    /// Texts of attempted edits, in order
    pub fn edits(&self) -> Vec<String> {
        self.edits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn reply(
        &self,
        chat_id: i64,
        _reply_to: i64,
        text: &str,
    ) -> Result<MessageRef, TransportError> {
        self.replies.lock().unwrap().push(text.to_string());
        Ok(MessageRef {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn edit(&self, _message: &MessageRef, text: &str) -> Result<EditOutcome, TransportError> {
        self.edits.lock().unwrap().push(text.to_string());
        self.edit_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(EditOutcome::Edited))
    }
}
