/// In-memory store
///
/// Keeps tasks and users in process memory behind a single `RwLock`. Task IDs
/// are assigned from a counter starting at 1. Deleting a user removes that
/// user's tasks in the same critical section, mirroring the foreign-key
/// cascade of the PostgreSQL schema.
///
/// Cloning a `MemoryStore` yields a handle to the same data.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use super::{TaskStore, UserStore};
use crate::error::{StoreError, StoreResult};
use crate::models::task::{today, CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct MemoryState {
    last_task_id: i64,
    tasks: BTreeMap<i64, Task>,
    users: HashMap<Uuid, User>,
}

/// Process-local task and user store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks across all owners
    pub async fn task_count(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    /// Number of registered users
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, data: CreateTask) -> StoreResult<Task> {
        data.validate()?;

        let mut state = self.state.write().await;

        if let Some(owner) = data.owner_id {
            if !state.users.contains_key(&owner) {
                return Err(StoreError::NotFound("User"));
            }
        }

        state.last_task_id += 1;
        let task = Task {
            id: state.last_task_id,
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            complete: data.complete,
            created: data.created.unwrap_or_else(today),
        };
        state.tasks.insert(task.id, task.clone());

        debug!(task_id = task.id, "Inserted task");
        Ok(task)
    }

    async fn get(&self, id: i64) -> StoreResult<Task> {
        self.state
            .read()
            .await
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn update(&self, id: i64, data: UpdateTask) -> StoreResult<Task> {
        data.validate()?;

        let mut state = self.state.write().await;
        let task = state.tasks.get_mut(&id).ok_or(StoreError::NotFound("Task"))?;
        data.apply_to(task);

        Ok(task.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.state
            .write()
            .await
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn list(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;

        // BTreeMap iterates by ID; a stable sort keeps that as the tie-breaker
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.is_owned_by(owner))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.complete);

        Ok(tasks)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            password_hash: data.password_hash,
            created_at: Utc::now(),
            last_login_at: None,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn record_login(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.last_login_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;

        if state.users.remove(&id).is_none() {
            return Err(StoreError::NotFound("User"));
        }

        let before = state.tasks.len();
        state.tasks.retain(|_, task| task.owner_id != Some(id));
        debug!(
            user_id = %id,
            tasks_removed = before - state.tasks.len(),
            "Deleted user and owned tasks"
        );

        Ok(())
    }
}
