/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use todo_api::{app::{build_router, AppState}, config::Config};
/// use todo_shared::store::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(MemoryStore::new(), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        security::SecurityHeadersLayer,
        session::{require_session, session_context},
    },
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use std::sync::Arc;
use todo_shared::{
    models::task,
    service::TaskService,
    store::{TaskStore, UserStore},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Owner-scoped task operations
    pub tasks: TaskService,

    /// Account storage
    pub users: Arc<dyn UserStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state over a single store serving both tasks and users
    pub fn new<S>(store: S, config: Config) -> Self
    where
        S: TaskStore + UserStore + 'static,
    {
        let store = Arc::new(store);

        Self {
            tasks: TaskService::new(store.clone()),
            users: store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Reference date for relative-date filters, read once per request
    pub fn today(&self) -> NaiveDate {
        task::today()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET      /health                 # Health check (public)
/// ├── GET|POST /login/                 # Login (public)
/// ├── GET|POST /logout/                # Logout (public)
/// ├── GET|POST /register/              # Registration (public)
/// ├── GET      /                       # Task list (session)
/// ├── GET      /tasks/:id/             # Task detail (session)
/// ├── GET|POST /tasks/create/          # Create task (session)
/// ├── GET|POST /tasks/update/:id/      # Update task (session)
/// └── GET|POST /tasks/delete/:id/      # Delete task (session)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Session resolution (every route)
/// 5. Login redirect (task routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Task pages (redirect to login without a session)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/tasks/:id/", get(routes::tasks::task_detail))
        .route(
            "/tasks/create/",
            get(routes::tasks::create_form).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/update/:id/",
            get(routes::tasks::update_form).post(routes::tasks::update_task),
        )
        .route(
            "/tasks/delete/:id/",
            get(routes::tasks::delete_confirm).post(routes::tasks::delete_task),
        )
        .route_layer(axum::middleware::from_fn(require_session));

    // Auth pages and health (public)
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/login/",
            get(routes::auth::login_page).post(routes::auth::login),
        )
        .route(
            "/logout/",
            get(routes::auth::logout).post(routes::auth::logout),
        )
        .route(
            "/register/",
            get(routes::auth::register_page).post(routes::auth::register),
        );

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(task_routes)
        .merge(public_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_context,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
