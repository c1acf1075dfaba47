//! Axum handlers for `/api/*` and `/health`.
//!
//! Each handler runs its guards first (rate limit, admin), then validates,
//! then touches the store or the answer generator. A failed guard or
//! validation returns before any side effect.

use std::net::SocketAddr;

use axum::{
    Form, Json,
    extract::{
        ConnectInfo, Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::HeaderMap,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::store::hash_ip;

use super::{AppState, auth, error::ApiError, run_blocking};

/// Default page size for `GET /api/thoughts`.
pub const DEFAULT_LIST_LIMIT: i64 = 20;
/// Upper clamp for `GET /api/thoughts?limit=`.
pub const MAX_LIST_LIMIT: i64 = 100;
/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct ListParams {
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub(super) struct ThoughtForm {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
pub(super) struct AskForm {
    #[serde(default)]
    question: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/thoughts
pub(super) async fn list_thoughts(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| {
        debug!(error = %e, "rejected thoughts query");
        ApiError::Validation("limit must be an integer")
    })?;
    let limit = clamp_limit(params.limit);

    let store = state.store.clone();
    let thoughts = run_blocking(move || store.list_thoughts(limit)).await?;
    Ok(Json(json!({ "thoughts": thoughts })))
}

/// POST /api/thoughts: admin only.
pub(super) async fn add_thought(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<ThoughtForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    auth::require_admin(&headers, &state.admin_key).inspect_err(|_| {
        warn!("add thought rejected: bad or missing admin credential");
    })?;

    let content = form
        .map(|Form(f)| f.content.trim().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(ApiError::Validation("Empty thought"));
    }

    let store = state.store.clone();
    let id = run_blocking(move || store.add_thought(&content)).await?;
    info!(thought_id = id, "thought added");
    Ok(Json(json!({ "id": id, "status": "ok" })))
}

/// POST /api/ask: rate limited per client address.
pub(super) async fn ask(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    form: Result<Form<AskForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    let ip_hash = hash_ip(&peer.ip().to_string());

    state.limiter.check(peer.ip()).map_err(|retry_after| {
        warn!(%ip_hash, retry_after_secs = retry_after.as_secs(), "ask rate limited");
        ApiError::RateLimited { retry_after_secs: retry_after.as_secs().max(1) }
    })?;

    let question = form
        .map(|Form(f)| f.question.trim().to_string())
        .unwrap_or_default();
    validate_question(&question)?;

    let answer = state.llm.answer(&question).await?;

    let store = state.store.clone();
    let (q, a, h) = (question.clone(), answer.clone(), ip_hash.clone());
    // The answer already exists; a failed audit write is logged, not surfaced.
    if let Err(e) = run_blocking(move || store.log_question(&q, &a, &h)).await {
        error!(%ip_hash, error = %e, "failed to log answered question");
    }

    info!(%ip_hash, question_len = question.chars().count(), "question answered");
    Ok(Json(json!({ "answer": answer })))
}

/// GET /health
pub(super) async fn health() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn clamp_limit(limit: Option<i64>) -> u32 {
    // Clamped into 0..=100, so the cast is lossless.
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(0, MAX_LIST_LIMIT) as u32
}

fn validate_question(question: &str) -> Result<(), ApiError> {
    if question.is_empty() {
        return Err(ApiError::Validation("Empty question"));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::Validation("Question too long (max 500 chars)"));
    }
    Ok(())
}
