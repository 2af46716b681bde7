//! HTTP API handlers for meetwise-api

pub mod action_items;
pub mod auth;
pub mod briefing;
pub mod health;
pub mod meetings;
pub mod sparring;
pub mod webhooks;

pub use action_items::action_item_routes;
pub use auth::{auth_middleware, AuthContext};
pub use briefing::briefing_routes;
pub use health::health_routes;
pub use meetings::meeting_routes;
pub use sparring::sparring_routes;
pub use webhooks::webhook_routes;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Parse a path id; anything that is not a UUID cannot exist
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", what)))
}
