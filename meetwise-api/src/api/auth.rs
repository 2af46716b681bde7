//! Bearer authentication middleware for meetwise-api
//!
//! Verifies the `Authorization: Bearer <token>` header and attaches an
//! [`AuthContext`] to the request. Handlers take the context as an
//! `Extension` and pass it explicitly into every service call; nothing reads
//! identity from ambient state.
//!
//! `/health` and `/webhooks/*` are mounted outside this middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use meetwise_common::api::auth::{parse_bearer, verify_token, ApiAuthError};
use meetwise_common::models::User;
use meetwise_common::time;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// Identity of the caller of one request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Identity provider subject from the verified token
    pub subject: String,
    /// Local user record, `None` until the identity webhook has created it
    pub user: Option<User>,
}

impl AuthContext {
    /// The caller's local user record
    pub fn user(&self) -> ApiResult<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }
}

impl From<ApiAuthError> for ApiError {
    fn from(err: ApiAuthError) -> Self {
        match err {
            ApiAuthError::DatabaseError(msg) => ApiError::Internal(msg),
            ApiAuthError::MalformedToken(_) => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

/// Authentication middleware
///
/// Returns 401 when the header is missing, is not a bearer token, or the token
/// fails verification. A shared secret of 0 skips signature and expiry checks.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(ApiAuthError::MissingHeader)?
        .to_str()
        .map_err(|_| ApiAuthError::MissingBearer)?;

    let token = parse_bearer(header)?;

    let claims = verify_token(token, state.shared_secret, time::now_millis()).map_err(|e| {
        warn!("Token rejected: {:?}", e);
        e
    })?;

    let user = db::users::find_by_external_id(&state.db, &claims.subject).await?;
    if user.is_none() {
        debug!(subject = %claims.subject, "Authenticated subject has no local user yet");
    }

    request.extensions_mut().insert(AuthContext {
        subject: claims.subject,
        user,
    });

    Ok(next.run(request).await)
}
