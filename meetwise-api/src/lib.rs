//! meetwise-api library
//!
//! REST backend for action items, meetings and their attendee directory,
//! briefing dossiers and sparring practice sessions, over SQLite.

use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Default request body cap, matches the `http_max_body_size_bytes` setting default
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Shared secret for bearer tokens (0 disables verification)
    pub shared_secret: i64,
    /// Secret for identity webhooks; webhooks are rejected when unset
    pub webhook_secret: Option<String>,
    pub max_body_bytes: usize,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(db: SqlitePool, shared_secret: i64) -> Self {
        Self {
            db,
            shared_secret,
            webhook_secret: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            startup_time: Instant::now(),
        }
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

/// Build application router
///
/// Everything except `/health` and `/webhooks/*` sits behind the bearer
/// authentication middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(api::action_item_routes())
        .merge(api::meeting_routes())
        .merge(api::briefing_routes())
        .merge(api::sparring_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::webhook_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
