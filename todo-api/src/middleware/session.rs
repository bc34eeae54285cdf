/// Session middleware
///
/// Two layers split the work:
///
/// - [`session_context`] runs on every request. It resolves the session
///   cookie or a `Bearer` token into an [`AuthContext`] and inserts it into
///   request extensions. It never rejects a cookie request: a stale or forged
///   cookie just leaves the caller anonymous. An explicit `Authorization`
///   header that fails to resolve is answered with 401.
/// - [`require_session`] guards the task pages and redirects anonymous
///   callers to the login page with the requested path in `next`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use todo_shared::auth::middleware::{authenticate, bearer_token, AuthContext, AuthError, SESSION_COOKIE};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

/// Path of the login page
pub const LOGIN_PATH: &str = "/login/";

/// Resolves the caller's session, if any
pub async fn session_context(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let auth = if let Some(token) = bearer {
        Some(authenticate(&token, state.jwt_secret(), state.users.as_ref()).await?)
    } else if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match authenticate(cookie.value(), state.jwt_secret(), state.users.as_ref()).await {
            Ok(ctx) => Some(ctx),
            Err(AuthError::DatabaseError(msg)) => return Err(ApiError::InternalError(msg)),
            Err(err) => {
                debug!(error = %err, "Ignoring unusable session cookie");
                None
            }
        }
    } else {
        None
    };

    if let Some(ctx) = auth {
        request.extensions_mut().insert(ctx);
    }

    Ok(next.run(request).await)
}

/// Redirects anonymous callers to the login page
///
/// Must be layered inside [`session_context`].
pub async fn require_session(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthContext>().is_some() {
        return next.run(request).await;
    }

    let requested = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    debug!(path = requested, "Anonymous request to protected page");
    Redirect::to(&login_redirect_target(requested)).into_response()
}

/// `/login/?next=<path>` with `path` percent-encoded
pub fn login_redirect_target(next: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, encode_query_value(next))
}

fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}
