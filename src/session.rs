//! Conversation session controller
//!
//! Owns all per-user state: cooldown timestamps, dialogue position, and the
//! in-flight generation guard. A single instance serves every user; flows
//! for different users run concurrently on spawned tasks, so each map sits
//! behind its own lock. Locks are never held across await points.

mod coalescer;
mod cooldown;
mod dialogue;
mod flow;
mod traits;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod testing;

pub use dialogue::{DialogueEvent, DialogueState};
pub use traits::{ChatTransport, EditOutcome, MessageRef};

use crate::config::{Config, GenerationMode};
use crate::llm::GenerationClient;
use cooldown::RateLimiter;
use dialogue::{transition, Directive};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed user-visible apology for any terminal generation failure.
pub const FAILURE_TEXT: &str = "Sorry, an error occurred while processing the request.";
/// Sent when a user triggers a new generation while one is already running.
const BUSY_TEXT: &str = "I'm still working on your previous joke, give me a moment.";

/// Flow knobs lifted out of [`Config`] so tests can construct them directly.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cooldown: Duration,
    pub max_attempts: u32,
    pub mode: GenerationMode,
    pub flush_interval: Duration,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            cooldown: config.cooldown,
            max_attempts: config.max_attempts,
            mode: config.mode,
            flush_interval: config.flush_interval,
        }
    }
}

pub struct SessionController {
    llm: Arc<dyn GenerationClient>,
    transport: Arc<dyn ChatTransport>,
    limiter: RateLimiter,
    dialogue: Mutex<HashMap<i64, DialogueState>>,
    in_flight: Mutex<HashMap<i64, CancellationToken>>,
    settings: SessionSettings,
    shutdown: CancellationToken,
}

impl SessionController {
    pub fn new(
        llm: Arc<dyn GenerationClient>,
        transport: Arc<dyn ChatTransport>,
        settings: SessionSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            llm,
            transport,
            limiter: RateLimiter::new(settings.cooldown),
            dialogue: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            settings,
            shutdown,
        }
    }

    /// Handle one inbound event for a user, running any generation flow it
    /// triggers to completion.
    pub async fn handle_event(&self, user_id: i64, chat_id: i64, message_id: i64, event: DialogueEvent) {
        let directive = {
            let mut dialogue = self.dialogue.lock().unwrap();
            let state = dialogue.get(&user_id).copied().unwrap_or_default();
            let (next, directive) = transition(state, event);
            dialogue.insert(user_id, next);
            directive
        };

        match directive {
            Directive::SendWelcome => self.send(chat_id, message_id, dialogue::WELCOME_TEXT).await,
            Directive::AskForTopic => self.send(chat_id, message_id, dialogue::ASK_TOPIC_TEXT).await,
            Directive::Generate(request) => {
                self.run_generation(user_id, chat_id, message_id, request).await;
            }
            Directive::Ignore => {}
        }
    }

    /// Claim the per-user in-flight slot. `None` means a flow is already
    /// running for this user.
    fn begin_flow(&self, user_id: i64) -> Option<CancellationToken> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if in_flight.contains_key(&user_id) {
            return None;
        }
        let token = self.shutdown.child_token();
        in_flight.insert(user_id, token.clone());
        Some(token)
    }

    /// Release the in-flight slot and reset dialogue state. Runs on every
    /// flow exit path, success or not.
    fn end_flow(&self, user_id: i64) {
        self.in_flight.lock().unwrap().remove(&user_id);
        self.reset_dialogue(user_id);
    }

    fn reset_dialogue(&self, user_id: i64) {
        self.dialogue
            .lock()
            .unwrap()
            .insert(user_id, DialogueState::Idle);
    }

    async fn send(&self, chat_id: i64, reply_to: i64, text: &str) {
        if let Err(err) = self.transport.reply(chat_id, reply_to, text).await {
            tracing::warn!(error = %err, chat_id, "failed to send message");
        }
    }

    /// Best-effort edit: "not modified" counts as success, any other failure
    /// is logged and swallowed.
    async fn try_edit(&self, message: &MessageRef, text: &str) {
        if let Err(err) = self.transport.edit(message, text).await {
            tracing::warn!(error = %err, "message edit failed");
        }
    }
}
