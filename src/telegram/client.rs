//! Bot API client implementation

use super::types::{ApiResponse, SentMessage, Update};
use super::TransportError;
use crate::config::ConfigError;
use crate::session::{ChatTransport, EditOutcome, MessageRef};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Seconds the server holds a `getUpdates` call open before returning empty.
const LONG_POLL_SECS: u64 = 25;
/// Client-side ceiling; must exceed the long-poll hold.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, ConfigError> {
        if token.trim().is_empty() {
            return Err(ConfigError::Missing("BOT_TOKEN"));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{token}"),
        })
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": LONG_POLL_SECS,
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &body).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?;

        // The Bot API reports failures in the envelope, not the HTTP status.
        let body = response.text().await?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body)?;
        into_result(parsed)
    }
}

fn into_result<T>(response: ApiResponse<T>) -> Result<T, TransportError> {
    if response.ok {
        response.result.ok_or(TransportError::Api {
            code: 0,
            description: "missing result payload".to_string(),
        })
    } else {
        Err(TransportError::Api {
            code: response.error_code.unwrap_or_default(),
            description: response
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

/// Editing a message to its current text is a 400 from the Bot API, but for
/// the streaming coalescer it means "already up to date".
fn is_not_modified(err: &TransportError) -> bool {
    matches!(
        err,
        TransportError::Api { code: 400, description }
            if description.contains("message is not modified")
    )
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn reply(
        &self,
        chat_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<MessageRef, TransportError> {
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "reply_to_message_id": reply_to,
        });
        let sent: SentMessage = self.call("sendMessage", &body).await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit(&self, message: &MessageRef, text: &str) -> Result<EditOutcome, TransportError> {
        let body = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        match self.call::<serde_json::Value>("editMessageText", &body).await {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(err) if is_not_modified(&err) => Ok(EditOutcome::NotModified),
            Err(err) => Err(err),
        }
    }
}
