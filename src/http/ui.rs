//! Homepage rendering.
//!
//! The template is compiled into the binary and registered under an `.html`
//! name, so tera autoescapes every interpolated thought.

use axum::{extract::State, response::Html};
use chrono::Utc;
use tera::{Context, Tera};

use crate::error::AppError;

use super::{AppState, error::ApiError, run_blocking};

/// Number of thoughts shown on the homepage.
pub const HOME_THOUGHTS: u32 = 20;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Build the template registry used by [`home`].
pub fn templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_template("index.html", INDEX_TEMPLATE)
        .map_err(|e| AppError::Server(format!("cannot compile index.html: {e}")))?;
    Ok(tera)
}

/// GET /
pub(super) async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let store = state.store.clone();
    let thoughts = run_blocking(move || store.list_thoughts(HOME_THOUGHTS)).await?;

    let mut context = Context::new();
    context.insert("thoughts", &thoughts);
    context.insert("now", &Utc::now().format("%Y-%m-%d %H:%M UTC").to_string());

    let page = state
        .templates
        .render("index.html", &context)
        .map_err(|e| AppError::Server(format!("render index.html: {e}")))?;
    Ok(Html(page))
}
