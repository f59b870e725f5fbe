//! Streaming coalescer
//!
//! Consumes the token stream from the generation client and folds it into
//! rate-limited edits of a single progress message, so the transport's
//! edit-rate quota is respected no matter how fast fragments arrive. Once
//! the stream ends successfully, the complete accumulated text is displayed
//! even if intermediate edits were throttled or dropped.

use super::{ChatTransport, MessageRef, FAILURE_TEXT};
use crate::llm::TokenStream;
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Terminal state of one relayed stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed { text: String },
    Failed,
    Cancelled,
}

pub async fn relay(
    mut stream: TokenStream,
    transport: &dyn ChatTransport,
    message: &MessageRef,
    flush_interval: Duration,
    cancel: &CancellationToken,
) -> StreamOutcome {
    let mut buffer = String::new();
    let mut flushed = String::new();

    loop {
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => return StreamOutcome::Cancelled,
            item = stream.next() => item,
        };
        let Some(item) = item else { break };

        match item {
            Ok(fragment) => {
                buffer.push_str(&fragment);
                if buffer == flushed {
                    continue;
                }
                if attempt_edit(transport, message, &buffer).await {
                    flushed.clone_from(&buffer);
                }
                // Back-pressure against the transport's edit-rate quota.
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return StreamOutcome::Cancelled,
                    () = tokio::time::sleep(flush_interval) => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation stream failed mid-flight");
                attempt_edit(transport, message, FAILURE_TEXT).await;
                return StreamOutcome::Failed;
            }
        }
    }

    if buffer.is_empty() {
        // The backend closed the stream without producing anything.
        attempt_edit(transport, message, FAILURE_TEXT).await;
        return StreamOutcome::Failed;
    }
    if buffer != flushed {
        attempt_edit(transport, message, &buffer).await;
    }
    StreamOutcome::Completed { text: buffer }
}

/// Best-effort edit: "not modified" counts as success, any other failure is
/// logged and does not abort the stream.
async fn attempt_edit(transport: &dyn ChatTransport, message: &MessageRef, text: &str) -> bool {
    match transport.edit(message, text).await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "message edit failed");
            false
        }
    }
}
