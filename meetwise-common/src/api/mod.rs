//! Shared HTTP API functionality
//!
//! Contains ONLY pure functions, database operations and shared types.
//! meetwise-api wraps these with axum middleware.

pub mod auth;

pub use auth::{
    calculate_token_hash, calculate_webhook_signature, issue_token, parse_bearer, verify_token,
    validate_webhook_signature, ApiAuthError, TokenClaims,
};

#[cfg(feature = "sqlx")]
pub use auth::{initialize_shared_secret, load_shared_secret};
