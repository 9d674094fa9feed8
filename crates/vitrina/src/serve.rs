// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vitrina serve` command implementation.
//!
//! Wires the SQLite store, the Gemini-compatible backend, and the Telegram
//! transport into the dispatcher, then pumps inbound events until a
//! shutdown signal arrives.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use vitrina_config::model::VitrinaConfig;
use vitrina_core::{AiBackend, ChatTransport, IntentClassifier, Store, VitrinaError};
use vitrina_engine::Dispatcher;
use vitrina_gemini::{GeminiBackend, GeminiClassifier, GeminiClient};
use vitrina_storage::SqliteStore;
use vitrina_telegram::TelegramTransport;

use crate::shutdown;

/// Runs the `vitrina serve` command until SIGINT/SIGTERM.
pub async fn run_serve(config: VitrinaConfig) -> Result<(), VitrinaError> {
    init_tracing(&config.bot.log_level);
    info!(bot = %config.bot.name, "starting vitrina serve");

    let store = Arc::new(SqliteStore::open(&config.storage).await?);

    // One HTTP client serves the image, text, and classifier models.
    let client = GeminiClient::new(&config.backend)?;
    let backend = GeminiBackend::with_client(client.clone(), &config.backend);
    let classifier = GeminiClassifier::with_client(client, &config.backend);

    let transport = Arc::new(TelegramTransport::new(&config.telegram)?);

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone() as Arc<dyn Store>,
        transport.clone() as Arc<dyn ChatTransport>,
        Arc::new(backend) as Arc<dyn AiBackend>,
        Arc::new(classifier) as Arc<dyn IntentClassifier>,
        &config,
    ));

    let (tx, mut rx) = mpsc::channel(100);
    let polling = transport.spawn_polling(tx);
    let token = shutdown::install_signal_handler();

    info!("vitrina is ready");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        // Events from different users are independent;
                        // handle each on its own task.
                        let dispatcher = dispatcher.clone();
                        tokio::spawn(async move {
                            dispatcher.dispatch(event).await;
                        });
                    }
                    None => {
                        warn!("inbound channel closed, stopping");
                        break;
                    }
                }
            }
        }
    }

    polling.abort();
    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close store cleanly");
    }
    info!("vitrina shut down");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    // One directive per workspace crate; everything else stays at warn.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let crates = [
            "vitrina",
            "vitrina_engine",
            "vitrina_storage",
            "vitrina_ledger",
            "vitrina_gemini",
            "vitrina_telegram",
            "vitrina_config",
        ];
        let directives: Vec<String> = crates
            .iter()
            .map(|c| format!("{c}={log_level}"))
            .collect();
        EnvFilter::new(format!("{},warn", directives.join(",")))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
