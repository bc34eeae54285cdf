//! # Todo API Server
//!
//! Serves a per-user task list: task pages behind a cookie session, plus
//! login, logout and registration.
//!
//! ## Usage
//!
//! ```bash
//! STORE_BACKEND=memory JWT_SECRET=$(openssl rand -hex 32) cargo run -p todo-api
//! ```

use anyhow::Context;
use todo_api::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
};
use todo_shared::{
    db::{
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool::{create_pool, DatabaseConfig},
    },
    store::{MemoryStore, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Todo API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            let app = build_router(AppState::new(MemoryStore::new(), config));

            tracing::info!("Server listening on http://{}", bind_address);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        StoreBackend::Postgres => {
            let url = config
                .database
                .url
                .clone()
                .context("DATABASE_URL is required for the postgres backend")?;

            if !config.api.production {
                ensure_database_exists(&url).await?;
            }

            let pool = create_pool(DatabaseConfig {
                url,
                max_connections: config.database.max_connections,
                ..Default::default()
            })
            .await
            .context("Failed to connect to database")?;

            run_migrations(&pool).await?;
            let status = get_migration_status(&pool).await?;
            tracing::info!(
                applied_migrations = status.applied_migrations,
                latest_version = ?status.latest_version,
                pool_size = pool.size(),
                pool_idle = pool.num_idle(),
                "Database ready"
            );

            let app = build_router(AppState::new(PgStore::new(pool.clone()), config));

            tracing::info!("Server listening on http://{}", bind_address);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("Closing database connection pool");
            pool.close().await;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
