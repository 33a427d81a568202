//! EIP Governance API
//!
//! Tracks Ethereum Improvement Proposals through their lifecycle
//! (Draft, Review, Last Call, Final, Stagnant, Withdrawn, Living).
//!
//! A single Editor registers proposals and signs off on the late stages;
//! authors drive the early ones. Every mutation is checked against the
//! transition table in `governance::transitions` and published as an event.

mod auth;
mod config;
mod error;
mod governance;
mod identity;
mod models;
mod records;
mod routes;
mod state;

use crate::config::Settings;
use crate::governance::{RegistryEvent, SystemClock};
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("Starting EIP governance service...");

    // Load configuration
    let settings = Settings::load()?;
    info!("Configuration loaded (editor: {})", settings.editor);

    let state = Arc::new(AppState::new(&settings, Arc::new(SystemClock))?);
    if state.allow_dev_tokens {
        tracing::warn!("ALLOW_DEV_TOKENS is on: anyone can mint a token for any address");
    }

    spawn_event_logger(state.registry.subscribe().await);

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("API Endpoints:");
    info!("   GET  /api/editor                          - Current editor");
    info!("   PUT  /api/editor                          - Hand over the editor role");
    info!("   GET  /api/proposals                       - List proposals (?status=)");
    info!("   POST /api/proposals                       - Register a proposal (Editor)");
    info!("   GET  /api/proposals/{{id}}                  - Proposal lifecycle");
    info!("   POST /api/proposals/{{id}}/status           - Change status");
    info!("   GET  /api/proposals/{{id}}/transitions      - Transitions open to the caller");
    info!("   GET  /api/proposals/{{id}}/authors          - Authors");
    info!("   GET  /api/events                          - Registry event journal");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,eip_governance=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Mirror registry notifications into the log
fn spawn_event_logger(mut events: broadcast::Receiver<RegistryEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(?event, "registry event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event logger lagged, skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
