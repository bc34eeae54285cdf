/// Authentication endpoints
///
/// This module provides the session pages:
/// - Login
/// - Logout
/// - Registration
///
/// # Endpoints
///
/// - `GET  /login/` - Login form
/// - `POST /login/` - Check credentials, set the session cookie, redirect
/// - `GET|POST /logout/` - Clear the session cookie, redirect to `/login/`
/// - `GET  /register/` - Registration form (signed-in users go to `/`)
/// - `POST /register/` - Create the account, sign it in, redirect to `/`

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult, ValidationErrorDetail, NON_FIELD_ERRORS},
    middleware::session::LOGIN_PATH,
    routes::tasks::TASK_LIST_PATH,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use todo_shared::{
    auth::{
        jwt::{create_token, Claims},
        middleware::{AuthContext, SESSION_COOKIE},
        password::{hash_password, validate_password_strength, verify_password},
    },
    models::user::{CreateUser, User},
};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

/// Maximum username length
pub const USERNAME_MAX_LEN: usize = 150;

const REQUIRED: &str = "This field is required.";
const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// `?next=` on the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login page
#[derive(Debug, Serialize)]
pub struct LoginPageContext {
    pub fields: [&'static str; 2],

    /// Where a successful login will land
    pub next: Option<String>,

    /// Already signed-in user, if any
    pub username: Option<String>,
}

/// Login form
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Takes precedence over `?next=`
    pub next: Option<String>,
}

/// Registration page
#[derive(Debug, Serialize)]
pub struct RegisterPageContext {
    pub fields: [&'static str; 3],
}

/// Registration form
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password1: String,

    /// Confirmation
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,
}

/// Required, at most 150 characters, letters, digits and `@.+-_` only
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let message = if username.is_empty() {
        REQUIRED.to_string()
    } else if username.chars().count() > USERNAME_MAX_LEN {
        format!(
            "Ensure this value has at most {} characters (it has {}).",
            USERNAME_MAX_LEN,
            username.chars().count()
        )
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
            .to_string()
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("username");
    err.message = Some(message.into());
    Err(err)
}

/// Whether `next` is a path on this site
///
/// Rejects absolute URLs and protocol-relative `//host` forms. Browsers drop
/// tabs and newlines from a `Location`, so any whitespace or control character
/// rejects the path too.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
}

/// Session cookie for a freshly issued token
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Signs `user` in: issues a token and adds the session cookie
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> ApiResult<CookieJar> {
    let claims = Claims::with_expiration(user.id, &user.username, state.config.session_ttl());
    let token = create_token(&claims, state.jwt_secret())?;

    Ok(jar.add(session_cookie(token, state.config.api.production)))
}

/// Login form
pub async fn login_page(
    auth: Option<Extension<AuthContext>>,
    Query(query): Query<NextQuery>,
) -> Json<LoginPageContext> {
    Json(LoginPageContext {
        fields: ["username", "password"],
        next: query.next.filter(|next| is_safe_next(next)),
        username: auth.map(|Extension(ctx)| ctx.username),
    })
}

/// Checks credentials and starts a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let mut missing = Vec::new();
    if form.username.is_empty() {
        missing.push(ValidationErrorDetail::new("username", REQUIRED));
    }
    if form.password.is_empty() {
        missing.push(ValidationErrorDetail::new("password", REQUIRED));
    }
    if !missing.is_empty() {
        return Err(ApiError::ValidationError(missing));
    }

    let user = match state.users.find_user_by_username(&form.username).await? {
        Some(user) if verify_password(&form.password, &user.password_hash)? => user,
        _ => {
            warn!(username = %form.username, "Failed login attempt");
            return Err(ApiError::invalid(NON_FIELD_ERRORS, INVALID_LOGIN));
        }
    };

    state.users.record_login(user.id).await?;
    let jar = start_session(&state, jar, &user)?;

    let target = form
        .next
        .or(query.next)
        .filter(|next| is_safe_next(next))
        .unwrap_or_else(|| TASK_LIST_PATH.to_string());

    info!(user_id = %user.id, "User logged in");
    Ok((jar, Redirect::to(&target)))
}

/// Ends the session
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    (jar, Redirect::to(LOGIN_PATH))
}

/// Registration form
pub async fn register_page(auth: Option<Extension<AuthContext>>) -> Response {
    if auth.is_some() {
        return Redirect::to(TASK_LIST_PATH).into_response();
    }

    Json(RegisterPageContext {
        fields: ["username", "password1", "password2"],
    })
    .into_response()
}

/// Creates an account and signs it in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> ApiResult<(CookieJar, Redirect)> {
    let mut details = match form.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => validation_details(&errors),
    };

    if !form.password1.is_empty() && !form.password2.is_empty() {
        if form.password1 != form.password2 {
            details.push(ValidationErrorDetail::new(
                "password2",
                "The two password fields didn't match.",
            ));
        } else if let Err(problems) = validate_password_strength(&form.password2, &form.username) {
            details.extend(
                problems
                    .into_iter()
                    .map(|problem| ValidationErrorDetail::new("password2", problem)),
            );
        }
    }

    if details.is_empty()
        && state
            .users
            .find_user_by_username(&form.username)
            .await?
            .is_some()
    {
        details.push(ValidationErrorDetail::new(
            "username",
            "A user with that username already exists.",
        ));
    }

    if !details.is_empty() {
        details.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(ApiError::ValidationError(details));
    }

    let password_hash = hash_password(&form.password1)?;
    let user = state
        .users
        .create_user(CreateUser {
            username: form.username,
            password_hash,
        })
        .await?;

    state.users.record_login(user.id).await?;
    let jar = start_session(&state, jar, &user)?;

    info!(user_id = %user.id, "User registered");
    Ok((jar, Redirect::to(TASK_LIST_PATH)))
}
