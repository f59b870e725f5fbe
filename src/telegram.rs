//! Telegram Bot API transport
//!
//! Thin client over the HTTP Bot API: long-polled updates in, message
//! sends/edits out. The session controller only sees the `ChatTransport`
//! trait; everything Telegram-shaped stays in this module.

mod client;
mod types;

pub use client::TelegramClient;
pub use types::{Chat, IncomingMessage, Update, User};

use thiserror::Error;

/// Chat transport error
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed transport response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("telegram API error {code}: {description}")]
    Api { code: i64, description: String },
}
