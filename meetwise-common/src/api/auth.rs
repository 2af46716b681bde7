//! Bearer token and webhook signature validation
//!
//! # Token format
//!
//! `<subject>.<expires_at_ms>.<hash>` where `hash` is the SHA-256 (64 hex chars)
//! of `"<subject>.<expires_at_ms>"` followed by the shared secret as a decimal
//! i64 string. The subject is the identity provider's user id and must not
//! contain `.`.
//!
//! A shared secret of 0 disables signature and expiry checks: the first
//! segment of the token is taken as the subject. Intended for local
//! development only.
//!
//! # Webhook signatures
//!
//! Identity webhooks carry `webhook-id`, `webhook-timestamp` and
//! `webhook-signature` headers. The signature is the SHA-256 hex of
//! `"<id>.<timestamp>.<body>"` followed by the webhook secret.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the axum middleware wrapping these
//! lives in meetwise-api.

use sha2::{Digest, Sha256};

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq)]
pub enum ApiAuthError {
    /// Authorization header absent
    MissingHeader,

    /// Header present but not `Bearer <token>`
    MissingBearer,

    /// Token does not have the three expected segments
    MalformedToken(String),

    /// Token expiry lies in the past
    Expired { expires_at: i64, now: i64 },

    /// Hash does not match calculated value
    InvalidSignature,

    /// Database error loading shared secret
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingHeader => write!(f, "Authorization header is missing"),
            ApiAuthError::MissingBearer => write!(f, "Bearer token is missing"),
            ApiAuthError::MalformedToken(reason) => write!(f, "Malformed token: {}", reason),
            ApiAuthError::Expired { .. } => write!(f, "Invalid or expired token"),
            ApiAuthError::InvalidSignature => write!(f, "Invalid or expired token"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Verified token contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Identity provider subject
    pub subject: String,
    /// Expiry as Unix epoch milliseconds (0 when auth is disabled)
    pub expires_at: i64,
}

// ========================================
// Shared Secret Management
// ========================================

/// Load shared secret from database settings
///
/// Key `auth_shared_secret`. Generates and stores a new secret when absent.
#[cfg(feature = "sqlx")]
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'auth_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate a random non-zero secret and store it
#[cfg(feature = "sqlx")]
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('auth_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

// ========================================
// Bearer tokens
// ========================================

/// Extract the token from an `Authorization` header value
///
/// ```
/// use meetwise_common::api::auth::parse_bearer;
///
/// assert_eq!(parse_bearer("Bearer abc").unwrap(), "abc");
/// assert!(parse_bearer("Bearer ").is_err());
/// assert!(parse_bearer("Basic abc").is_err());
/// ```
pub fn parse_bearer(header: &str) -> Result<&str, ApiAuthError> {
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiAuthError::MissingBearer);
    }
    Ok(token)
}

/// Calculate the token hash for a subject and expiry
pub fn calculate_token_hash(subject: &str, expires_at: i64, shared_secret: i64) -> String {
    let to_hash = format!("{}.{}{}", subject, expires_at, shared_secret);
    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issue a signed bearer token
///
/// ```
/// use meetwise_common::api::auth::{issue_token, verify_token};
///
/// let token = issue_token("user_123", 2_000_000_000_000, 42);
/// let claims = verify_token(&token, 42, 1_900_000_000_000).unwrap();
/// assert_eq!(claims.subject, "user_123");
/// ```
pub fn issue_token(subject: &str, expires_at: i64, shared_secret: i64) -> String {
    format!(
        "{}.{}.{}",
        subject,
        expires_at,
        calculate_token_hash(subject, expires_at, shared_secret)
    )
}

/// Verify a bearer token against the shared secret at time `now` (epoch ms)
pub fn verify_token(token: &str, shared_secret: i64, now: i64) -> Result<TokenClaims, ApiAuthError> {
    if shared_secret == 0 {
        let subject = token.split('.').next().unwrap_or_default();
        if subject.is_empty() {
            return Err(ApiAuthError::MalformedToken("empty subject".to_string()));
        }
        return Ok(TokenClaims {
            subject: subject.to_string(),
            expires_at: 0,
        });
    }

    let segments: Vec<&str> = token.split('.').collect();
    let [subject, expires_at, hash] = segments.as_slice() else {
        return Err(ApiAuthError::MalformedToken(format!(
            "expected 3 segments, got {}",
            segments.len()
        )));
    };

    if subject.is_empty() {
        return Err(ApiAuthError::MalformedToken("empty subject".to_string()));
    }

    let expires_at: i64 = expires_at
        .parse()
        .map_err(|_| ApiAuthError::MalformedToken("expiry is not an integer".to_string()))?;

    if !constant_time_eq(&calculate_token_hash(subject, expires_at, shared_secret), hash) {
        return Err(ApiAuthError::InvalidSignature);
    }

    if expires_at < now {
        return Err(ApiAuthError::Expired { expires_at, now });
    }

    Ok(TokenClaims {
        subject: subject.to_string(),
        expires_at,
    })
}

/// Compare two digests without exiting at the first differing byte
fn constant_time_eq(expected: &str, actual: &str) -> bool {
    let (expected, actual) = (expected.as_bytes(), actual.as_bytes());
    if expected.len() != actual.len() {
        return false;
    }
    expected
        .iter()
        .zip(actual)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

// ========================================
// Webhook signatures
// ========================================

/// Calculate the signature of a webhook delivery
pub fn calculate_webhook_signature(id: &str, timestamp: &str, body: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(b".");
    hasher.update(timestamp.as_bytes());
    hasher.update(b".");
    hasher.update(body);
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate a webhook signature header
pub fn validate_webhook_signature(
    id: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    secret: &str,
) -> Result<(), ApiAuthError> {
    if !constant_time_eq(&calculate_webhook_signature(id, timestamp, body, secret), signature) {
        return Err(ApiAuthError::InvalidSignature);
    }
    Ok(())
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: i64 = 123456789;
    const NOW: i64 = 1_730_000_000_000;

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token("user_abc", NOW + 60_000, SECRET);
        let claims = verify_token(&token, SECRET, NOW).unwrap();

        assert_eq!(claims.subject, "user_abc");
        assert_eq!(claims.expires_at, NOW + 60_000);
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        let hash = calculate_token_hash("user_abc", NOW, SECRET);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, calculate_token_hash("user_abc", NOW, 987654321));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token("user_abc", NOW - 1, SECRET);
        assert!(matches!(
            verify_token(&token, SECRET, NOW),
            Err(ApiAuthError::Expired { .. })
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("user_abc", NOW + 60_000, SECRET);
        assert_eq!(
            verify_token(&token, SECRET + 1, NOW),
            Err(ApiAuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_subject_rejected() {
        let token = issue_token("user_abc", NOW + 60_000, SECRET);
        let forged = token.replacen("user_abc", "user_xyz", 1);
        assert_eq!(
            verify_token(&forged, SECRET, NOW),
            Err(ApiAuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(matches!(
            verify_token("just-a-string", SECRET, NOW),
            Err(ApiAuthError::MalformedToken(_))
        ));
        assert!(matches!(
            verify_token("user.soon.abcd", SECRET, NOW),
            Err(ApiAuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_zero_secret_disables_checks() {
        let claims = verify_token("dev_user", 0, NOW).unwrap();
        assert_eq!(claims.subject, "dev_user");

        let claims = verify_token("dev_user.1.deadbeef", 0, NOW).unwrap();
        assert_eq!(claims.subject, "dev_user");
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer tok").unwrap(), "tok");
        assert_eq!(parse_bearer("bearer tok").unwrap(), "tok");
        assert_eq!(parse_bearer("Bearer"), Err(ApiAuthError::MissingBearer));
        assert_eq!(parse_bearer("Token tok"), Err(ApiAuthError::MissingBearer));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc123", "abc123"));
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc123", "abc12"));
        assert!(!constant_time_eq("", "a"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_webhook_signature() {
        let body = br#"{"type":"user.created"}"#;
        let sig = calculate_webhook_signature("msg_1", "1730000000", body, "whsec");

        assert!(validate_webhook_signature("msg_1", "1730000000", &sig, body, "whsec").is_ok());
        assert!(validate_webhook_signature("msg_2", "1730000000", &sig, body, "whsec").is_err());
        assert!(validate_webhook_signature("msg_1", "1730000000", &sig, b"{}", "whsec").is_err());
    }
}
