//! Axum HTTP surface.
//!
//! ## URL layout
//!
//! ```text
//! GET  /              → homepage (20 newest thoughts)
//! GET  /api/thoughts  → {thoughts: [...]}        ?limit= (default 20, max 100)
//! POST /api/thoughts  → {id, status: "ok"}       admin bearer, form `content`
//! POST /api/ask       → {answer}                 3/min per address, form `question`
//! GET  /health        → {status: "alive", ts}
//! ```

mod api;
mod auth;
pub mod error;
pub mod rate_limit;
mod ui;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tera::Tera;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::llm::{LlmProvider, providers};
use crate::store::Store;

pub use api::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, MAX_QUESTION_CHARS};
pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use ui::HOME_THOUGHTS;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone; all fields are reference-counted or path-sized.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub llm: LlmProvider,
    pub limiter: Arc<RateLimiter>,
    /// Admin bearer secret; empty disables admin routes.
    pub admin_key: Arc<str>,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Assemble state from explicit parts. The store must already be
    /// initialised.
    pub fn new(
        store: Store,
        llm: LlmProvider,
        limiter: RateLimiter,
        admin_key: &str,
    ) -> Result<Self, AppError> {
        Ok(Self {
            store,
            llm,
            limiter: Arc::new(limiter),
            admin_key: Arc::from(admin_key),
            templates: Arc::new(ui::templates()?),
        })
    }

    /// Initialise the store and build the provider from resolved config.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let store = Store::open(&config.store.db_path)?;
        info!(db_path = %store.db_path().display(), "store ready");

        let llm = providers::build(&config.llm, config.llm_api_key.clone())?;
        if let Some(notice) = provider_notice(&llm, config.llm_api_key.is_some()) {
            warn!("{notice}");
        }
        if config.admin_key.is_empty() {
            info!("ADMIN_KEY not set: admin routes disabled");
        }

        Self::new(
            store,
            llm,
            RateLimiter::new(config.rate_limit),
            &config.admin_key,
        )
    }
}

/// Startup warning for provider setups that will not produce real answers.
fn provider_notice(llm: &LlmProvider, has_api_key: bool) -> Option<&'static str> {
    match llm {
        LlmProvider::Dummy(_) => {
            Some("dummy provider active: /api/ask echoes questions instead of answering")
        }
        LlmProvider::Anthropic(_) if !has_api_key => {
            Some("ANTHROPIC_API_KEY not set: /api/ask will answer 503")
        }
        LlmProvider::Anthropic(_) => None,
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/",             get(ui::home))
        .route("/api/thoughts", get(api::list_thoughts).post(api::add_thought))
        .route("/api/ask",      post(api::ask))
        .route("/health",       get(api::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    state: AppState,
    bind_addr: &str,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http server listening");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!(error = %e, "blocking task failed");
            Err(ApiError::Internal)
        }
    }
}
