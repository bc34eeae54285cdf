/// PostgreSQL store
///
/// Implements [`TaskStore`] and [`UserStore`] on top of the model queries in
/// [`crate::models`]. Task input is validated before any query is issued;
/// user deletion relies on `ON DELETE CASCADE` to remove owned tasks.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use super::{TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::error::{StoreError, StoreResult};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert(&self, data: CreateTask) -> StoreResult<Task> {
        data.validate()?;

        let task = Task::create(&self.pool, data).await?;
        debug!(task_id = task.id, "Inserted task");

        Ok(task)
    }

    async fn get(&self, id: i64) -> StoreResult<Task> {
        Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn update(&self, id: i64, data: UpdateTask) -> StoreResult<Task> {
        data.validate()?;

        Task::update(&self.pool, id, data)
            .await?
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        if Task::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound("Task"))
        }
    }

    async fn list(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_owner(&self.pool, owner).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn record_login(&self, id: Uuid) -> StoreResult<()> {
        if User::update_last_login(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound("User"))
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        if User::delete(&self.pool, id).await? {
            debug!(user_id = %id, "Deleted user");
            Ok(())
        } else {
            Err(StoreError::NotFound("User"))
        }
    }
}
