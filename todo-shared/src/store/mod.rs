/// Persistence seams for tasks and users
///
/// Handlers and services talk to storage through two traits:
///
/// - [`TaskStore`]: keyed task records, listed per owner
/// - [`UserStore`]: accounts, with cascading deletion of owned tasks
///
/// Two backends implement both:
///
/// - [`postgres::PgStore`]: PostgreSQL via `sqlx`
/// - [`memory::MemoryStore`]: process-local, for development and tests
///
/// Stores validate task input themselves, so an invalid title never reaches
/// the backing storage regardless of the caller.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task and returns it with its assigned ID
    ///
    /// Fails with `Validation` if the title is empty or longer than 100 characters.
    async fn insert(&self, data: CreateTask) -> StoreResult<Task>;

    /// Fetches a task, `NotFound` if absent
    async fn get(&self, id: i64) -> StoreResult<Task>;

    /// Applies a partial update, `NotFound` if absent
    async fn update(&self, id: i64, data: UpdateTask) -> StoreResult<Task>;

    /// Removes a task, `NotFound` if absent (a repeated delete is `NotFound`)
    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// All tasks of `owner`, incomplete first, then by ID
    async fn list(&self, owner: Uuid) -> StoreResult<Vec<Task>>;

    /// Reports whether the backing storage is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user, `Conflict` if the username is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Stamps `last_login_at`
    async fn record_login(&self, id: Uuid) -> StoreResult<()>;

    /// Deletes a user and every task the user owns, `NotFound` if absent
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}
