//! Trait abstractions for the controller's I/O seams
//!
//! These enable testing the session controller with mock implementations.

use crate::telegram::TransportError;
use async_trait::async_trait;

/// Handle to a sent message, accepted by `edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Result of an edit that reached the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The displayed text already matched; not an error.
    NotModified,
}

/// Outbound side of the chat transport
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new message in reply to an inbound one
    async fn reply(
        &self,
        chat_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<MessageRef, TransportError>;

    /// Replace the text of a previously sent message
    async fn edit(&self, message: &MessageRef, text: &str) -> Result<EditOutcome, TransportError>;
}
