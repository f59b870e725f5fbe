//! Joke generation flow
//!
//! Orchestrates one generation request end to end: cooldown gate, in-flight
//! guard, progress reply, then either the structured retry loop or the
//! streaming coalescer. Every exit path leaves a user-visible message and
//! clears the per-user state; no error escapes the flow.

use super::coalescer::{self, StreamOutcome};
use super::cooldown::Gate;
use super::dialogue::JokeRequest;
use super::{MessageRef, SessionController, BUSY_TEXT, FAILURE_TEXT};
use crate::config::GenerationMode;
use crate::llm::GenerationParams;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

const JSON_ENVELOPE_INSTRUCTION: &str =
    r#"Respond with only a JSON object of the form {"joke": "<the joke text>"}."#;

impl SessionController {
    pub(super) async fn run_generation(
        &self,
        user_id: i64,
        chat_id: i64,
        message_id: i64,
        request: JokeRequest,
    ) {
        let now = Instant::now();
        if let Gate::Reject { remaining_secs } = self.limiter.check(user_id, now) {
            tracing::info!(user_id, remaining_secs, "joke request rejected by cooldown");
            let wait = format!(
                "Please wait {remaining_secs} more seconds before generating another joke."
            );
            self.send(chat_id, message_id, &wait).await;
            self.reset_dialogue(user_id);
            return;
        }

        let Some(cancel) = self.begin_flow(user_id) else {
            tracing::info!(user_id, "rejected re-entrant generation request");
            self.send(chat_id, message_id, BUSY_TEXT).await;
            self.reset_dialogue(user_id);
            return;
        };

        // Recorded before the backend call so a slow response cannot be used
        // to slip extra requests past the cooldown.
        self.limiter.record(user_id, now);

        let progress = match self.transport.reply(chat_id, message_id, &request.ack).await {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, user_id, "failed to send progress message");
                self.end_flow(user_id);
                return;
            }
        };

        match self.settings.mode {
            GenerationMode::Structured => {
                self.generate_structured(user_id, &progress, &request.prompt).await;
            }
            GenerationMode::Streaming => {
                self.generate_streaming(user_id, &progress, &request.prompt, &cancel).await;
            }
        }

        self.end_flow(user_id);
    }

    /// Bounded retry loop against the structured response contract: the
    /// payload must embed a JSON object with a non-empty `"joke"` field.
    /// Transport errors and malformed payloads both consume an attempt.
    async fn generate_structured(&self, user_id: i64, progress: &MessageRef, prompt: &str) {
        let prompt = format!("{prompt}. {JSON_ENVELOPE_INSTRUCTION}");
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.llm.complete(&prompt, GenerationParams::default()).await {
                Ok(payload) => {
                    if let Some(joke) = extract_joke(&payload) {
                        tracing::info!(user_id, attempt, "joke generated");
                        self.try_edit(progress, &joke).await;
                        return;
                    }
                    tracing::warn!(user_id, attempt, "generation response missing joke field");
                }
                Err(err) => {
                    tracing::warn!(user_id, attempt, error = %err, "generation attempt failed");
                }
            }

            if attempt < max_attempts {
                let next = attempt + 1;
                let update = format!("Generating... (attempt {next}/{max_attempts})");
                self.try_edit(progress, &update).await;
            }
        }

        tracing::error!(user_id, max_attempts, "joke generation exhausted all attempts");
        self.try_edit(progress, FAILURE_TEXT).await;
    }

    async fn generate_streaming(
        &self,
        user_id: i64,
        progress: &MessageRef,
        prompt: &str,
        cancel: &CancellationToken,
    ) {
        match self.llm.stream(prompt, GenerationParams::default()).await {
            Ok(stream) => {
                let outcome = coalescer::relay(
                    stream,
                    self.transport.as_ref(),
                    progress,
                    self.settings.flush_interval,
                    cancel,
                )
                .await;
                match outcome {
                    StreamOutcome::Completed { text } => {
                        tracing::info!(user_id, chars = text.len(), "streamed joke complete");
                    }
                    StreamOutcome::Failed => {
                        tracing::warn!(user_id, "stream ended in failure");
                    }
                    StreamOutcome::Cancelled => {
                        tracing::info!(user_id, "stream cancelled");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(user_id, error = %err, "failed to open generation stream");
                self.try_edit(progress, FAILURE_TEXT).await;
            }
        }
    }
}

/// Pull the joke text out of a structured-mode payload.
///
/// Models wrap the envelope in prose or code fences often enough that the
/// parse targets the outermost `{...}` region rather than the whole payload.
fn extract_joke(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    let candidate = trimmed.get(start..=end)?;

    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let joke = value.get("joke")?.as_str()?.trim();
    if joke.is_empty() {
        return None;
    }
    Some(joke.to_string())
}
