//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An in-memory store behind the real router
//! - A signed-in test user and its session cookie
//! - Request and response helpers

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::NaiveDate;
use todo_api::app::{build_router, AppState};
use todo_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, StoreBackend};
use todo_shared::auth::jwt::{create_token, Claims};
use todo_shared::auth::password::hash_password;
use todo_shared::models::task::{CreateTask, Task};
use todo_shared::models::user::{CreateUser, User};
use todo_shared::store::{MemoryStore, TaskStore, UserStore};
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "testpass123";

/// Memory-backed configuration for tests
pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
            cors_origins: vec!["*".to_string()],
        },
        store: StoreBackend::Memory,
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            session_ttl_hours: 1,
        },
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    /// Shares state with the store inside `app`
    pub store: MemoryStore,
    pub app: Router,
    pub config: Config,
    pub user: User,
    /// `Cookie` header value for `user`
    pub cookie: String,
}

impl TestContext {
    /// Creates a new test context with an empty store and one signed-in user
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config();
        let store = MemoryStore::new();

        let user = store
            .create_user(CreateUser {
                username: "testuser".to_string(),
                password_hash: hash_password(TEST_PASSWORD)?,
            })
            .await?;
        let cookie = session_cookie_for(&user)?;

        let app = build_router(AppState::new(store.clone(), config.clone()));

        Ok(TestContext {
            store,
            app,
            config,
            user,
            cookie,
        })
    }

    /// Creates another user and returns it with its `Cookie` header value
    pub async fn create_user(&self, username: &str) -> anyhow::Result<(User, String)> {
        let user = self
            .store
            .create_user(CreateUser {
                username: username.to_string(),
                password_hash: "unused".to_string(),
            })
            .await?;
        let cookie = session_cookie_for(&user)?;
        Ok((user, cookie))
    }

    /// Inserts a task directly into the store
    pub async fn seed_task(
        &self,
        owner: &User,
        title: &str,
        complete: bool,
        created: NaiveDate,
    ) -> Task {
        self.store
            .insert(CreateTask {
                owner_id: Some(owner.id),
                title: title.to_string(),
                description: None,
                complete,
                created: Some(created),
            })
            .await
            .expect("Failed to seed task")
    }

    /// Sends `request` through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// GET, optionally with a `Cookie` header
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Form POST, optionally with a `Cookie` header
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// `session=<token>` for `user`
pub fn session_cookie_for(user: &User) -> anyhow::Result<String> {
    let token = create_token(&Claims::new(user.id, &user.username), TEST_SECRET)?;
    Ok(format!("session={}", token))
}

/// Reads the body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// The `Location` header of a redirect
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
}

/// The `name=value` part of the `Set-Cookie` header, if any
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or_default().to_string())
}

/// Titles of the tasks in a list context
pub fn titles(context: &serde_json::Value) -> Vec<String> {
    context["tasks"]
        .as_array()
        .expect("tasks should be an array")
        .iter()
        .map(|task| task["title"].as_str().unwrap().to_string())
        .collect()
}
