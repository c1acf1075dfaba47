//! Kai: HTTP server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Initialise the store and answer provider
//!   5. Spawn Ctrl-C / SIGTERM → shutdown signal watcher
//!   6. Serve HTTP until shutdown

use kai::{config, error::AppError, http, logger};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.server.log_level)?;

    info!(
        bind = %config.server.bind_addr(),
        db_path = %config.store.db_path.display(),
        provider = %config.llm.provider,
        log_level = %config.server.log_level,
        "config loaded"
    );

    let state = http::AppState::from_config(&config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        signal_token.cancel();
    });

    http::serve(state, &config.server.bind_addr(), shutdown).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
