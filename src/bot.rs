//! Update polling and command dispatch
//!
//! Long-polls the transport for inbound messages, parses each into a
//! dialogue event, and hands it to the session controller on its own task so
//! independent users' flows run concurrently.

use crate::session::{DialogueEvent, SessionController};
use crate::telegram::{IncomingMessage, TelegramClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct JokeBot {
    transport: Arc<TelegramClient>,
    controller: Arc<SessionController>,
}

impl JokeBot {
    pub fn new(transport: Arc<TelegramClient>, controller: Arc<SessionController>) -> Self {
        Self {
            transport,
            controller,
        }
    }

    /// Poll for updates until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut offset = 0i64;
        tracing::info!("starting update polling");

        loop {
            let updates = tokio::select! {
                () = shutdown.cancelled() => break,
                updates = self.transport.get_updates(offset) => updates,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some((user_id, chat_id, message_id, event)) =
                            parse_update(update.message)
                        else {
                            continue;
                        };
                        tracing::info!(user_id, ?event, "received event");
                        let controller = Arc::clone(&self.controller);
                        tokio::spawn(async move {
                            controller
                                .handle_event(user_id, chat_id, message_id, event)
                                .await;
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "getUpdates failed, backing off");
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("update polling stopped");
    }
}

fn parse_update(message: Option<IncomingMessage>) -> Option<(i64, i64, i64, DialogueEvent)> {
    let message = message?;
    let text = message.text?;
    let user = message.from?;
    Some((
        user.id,
        message.chat.id,
        message.message_id,
        parse_event(&text),
    ))
}

/// Map inbound text to a dialogue event. Known commands dispatch by tag;
/// anything else, including unrecognized commands, is treated as free text.
fn parse_event(text: &str) -> DialogueEvent {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return DialogueEvent::Text {
            text: trimmed.to_string(),
        };
    };

    let (command, args) = match rest.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (rest, ""),
    };
    // Commands arrive suffixed with the bot's username in group chats.
    let command = command.split('@').next().unwrap_or(command);

    match command {
        "start" => DialogueEvent::Start,
        "generate_random_joke" => DialogueEvent::RandomJoke,
        "generate_joke" => DialogueEvent::JokeCommand {
            topic: (!args.is_empty()).then(|| args.to_string()),
        },
        _ => DialogueEvent::Text {
            text: trimmed.to_string(),
        },
    }
}
