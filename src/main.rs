//! Jokesmith - joke generation chat bot
//!
//! A Telegram front end that turns chat commands into calls against an
//! OpenAI-compatible text-generation backend and streams the result back as
//! incremental message edits.

mod bot;
mod config;
mod llm;
mod session;
mod telegram;

use bot::JokeBot;
use config::Config;
use llm::{GenerationClient, LoggingClient, OpenAiClient};
use session::{ChatTransport, SessionController, SessionSettings};
use std::sync::Arc;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jokesmith=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Missing required configuration fails startup outright.
    let config = Config::from_env()?;

    let backend = Arc::new(OpenAiClient::new(&config)?);
    let llm: Arc<dyn GenerationClient> = Arc::new(LoggingClient::new(backend));
    let transport = Arc::new(TelegramClient::new(&config.bot_token)?);

    let shutdown = CancellationToken::new();
    let chat_transport: Arc<dyn ChatTransport> = transport.clone();
    let controller = Arc::new(SessionController::new(
        llm,
        chat_transport,
        SessionSettings::from(&config),
        shutdown.child_token(),
    ));

    tracing::info!(model = %config.model, mode = ?config.mode, "starting jokesmith");

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    JokeBot::new(transport, controller).run(shutdown).await;

    Ok(())
}
