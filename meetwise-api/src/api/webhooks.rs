//! Identity provider webhooks
//!
//! `POST /webhooks/identity` creates the local user record when the identity
//! provider reports `user.created`. Deliveries are signed; see
//! [`meetwise_common::api::auth::validate_webhook_signature`].

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use meetwise_common::api::auth::validate_webhook_signature;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
}

impl CreatedUser {
    fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /webhooks/identity
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let secret = state
        .webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::Internal("Webhook secret is not configured".to_string()))?;

    let (Some(id), Some(timestamp), Some(signature)) = (
        header(&headers, "webhook-id"),
        header(&headers, "webhook-timestamp"),
        header(&headers, "webhook-signature"),
    ) else {
        return Err(ApiError::BadRequest("Missing webhook headers".to_string()));
    };

    if validate_webhook_signature(id, timestamp, signature, &body, secret).is_err() {
        warn!(webhook_id = %id, "Webhook signature mismatch");
        return Err(ApiError::BadRequest("Webhook verification failed".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Webhook verification failed".to_string()))?;

    if event.kind == "user.created" {
        handle_user_created(&state, event.data).await;
    } else {
        debug!(kind = %event.kind, "Ignoring webhook event");
    }

    Ok(Json(WebhookAck {
        status: "success".to_string(),
    }))
}

/// Insert the new user. Failures are logged and the delivery still acknowledged.
async fn handle_user_created(state: &AppState, data: Value) {
    let created: CreatedUser = match serde_json::from_value(data) {
        Ok(created) => created,
        Err(e) => {
            warn!("Malformed user.created payload: {}", e);
            return;
        }
    };

    let Some(email) = created.email_addresses.first().map(|e| e.email_address.clone()) else {
        warn!(subject = %created.id, "user.created without an email address");
        return;
    };

    match db::users::insert_user(&state.db, &created.id, &email, &created.display_name()).await {
        Ok(user) => info!(user_id = %user.id, subject = %user.external_id, "User created from webhook"),
        Err(e) => warn!(subject = %created.id, "Failed to create user from webhook: {}", e),
    }
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/identity", post(identity_webhook))
}
