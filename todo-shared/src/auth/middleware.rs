/// Session resolution
///
/// Turns a session token into an [`AuthContext`]: the token must validate and
/// its subject must still exist (a deleted account invalidates every session
/// it had). The HTTP layer decides where the token comes from and what to do
/// with an anonymous request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::store::UserStore;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// User ID
    pub user_id: Uuid,

    /// Username
    pub username: String,
}

/// Session resolution failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token failed validation
    #[error("Invalid session: {0}")]
    InvalidToken(String),

    /// Token is valid but its user no longer exists
    #[error("Unknown user")]
    UnknownUser,

    /// User lookup failed
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Resolves `token` into the caller it belongs to
///
/// # Errors
///
/// - `InvalidToken` for a bad signature, wrong issuer or expired token
/// - `UnknownUser` if the subject has been deleted
/// - `DatabaseError` if the lookup fails
pub async fn authenticate(
    token: &str,
    secret: &str,
    users: &dyn UserStore,
) -> Result<AuthContext, AuthError> {
    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    let user = users
        .find_user_by_id(claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext {
        user_id: user.id,
        username: user.username,
    })
}

/// Extracts a bearer token from an `Authorization` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
