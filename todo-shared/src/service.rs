/// Task CRUD service
///
/// The only component that mutates tasks. It sits between the HTTP handlers
/// and a [`TaskStore`] and adds the rules the store itself does not know:
///
/// - listings are always scoped to the acting user, then narrowed by
///   [`filter::apply`](crate::filter::apply)
/// - the incomplete counter covers the user's whole list, not the filtered view
/// - new tasks always belong to the acting user, whatever owner the input named
/// - a task owned by someone else is reported as `NotFound` on read, update
///   and delete
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use todo_shared::filter::TaskFilter;
/// use todo_shared::models::task::{today, CreateTask};
/// use todo_shared::models::user::CreateUser;
/// use todo_shared::service::TaskService;
/// use todo_shared::store::{MemoryStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store
///     .create_user(CreateUser {
///         username: "alice".to_string(),
///         password_hash: "hash".to_string(),
///     })
///     .await?;
///
/// let service = TaskService::new(Arc::new(store));
/// service
///     .create(user.id, CreateTask {
///         owner_id: None,
///         title: "Water plants".to_string(),
///         description: None,
///         complete: false,
///         created: None,
///     })
///     .await?;
///
/// let listing = service.list_for(user.id, &TaskFilter::default(), today()).await?;
/// assert_eq!(listing.incomplete_count, 1);
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::filter::{self, TaskFilter};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::store::TaskStore;

/// A user's filtered task list plus the unfiltered outstanding-work counter
#[derive(Debug, Clone, Serialize)]
pub struct TaskListing {
    pub tasks: Vec<Task>,

    /// Incomplete tasks across the user's whole list
    pub incomplete_count: usize,
}

/// Ownership-enforcing task operations
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// The store this service writes through
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Lists `user`'s tasks narrowed by `filter`
    ///
    /// `today` is the reference date for every relative-date bucket in this call.
    pub async fn list_for(
        &self,
        user: Uuid,
        filter: &TaskFilter,
        today: NaiveDate,
    ) -> StoreResult<TaskListing> {
        let tasks = self.store.list(user).await?;
        let incomplete_count = tasks.iter().filter(|task| !task.complete).count();
        let tasks = filter::apply(tasks, filter, today);

        debug!(
            user_id = %user,
            shown = tasks.len(),
            incomplete_count,
            "Listed tasks"
        );

        Ok(TaskListing {
            tasks,
            incomplete_count,
        })
    }

    /// Creates a task owned by `user`
    ///
    /// Any `owner_id` in `data` is overwritten.
    pub async fn create(&self, user: Uuid, mut data: CreateTask) -> StoreResult<Task> {
        data.owner_id = Some(user);
        let task = self.store.insert(data).await?;

        info!(user_id = %user, task_id = task.id, "Task created");
        Ok(task)
    }

    /// Fetches one of `user`'s tasks
    pub async fn get_detail(&self, user: Uuid, id: i64) -> StoreResult<Task> {
        let task = self.store.get(id).await?;

        if !task.is_owned_by(user) {
            debug!(user_id = %user, task_id = id, "Task belongs to another owner");
            return Err(StoreError::NotFound("Task"));
        }

        Ok(task)
    }

    /// Updates one of `user`'s tasks
    pub async fn update(&self, user: Uuid, id: i64, data: UpdateTask) -> StoreResult<Task> {
        self.get_detail(user, id).await?;
        let task = self.store.update(id, data).await?;

        info!(user_id = %user, task_id = id, "Task updated");
        Ok(task)
    }

    /// Deletes one of `user`'s tasks
    pub async fn delete(&self, user: Uuid, id: i64) -> StoreResult<()> {
        self.get_detail(user, id).await?;
        self.store.delete(id).await?;

        info!(user_id = %user, task_id = id, "Task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{CreateUser, User};
    use crate::store::{MemoryStore, UserStore};
    use chrono::Duration;

    struct Fixture {
        store: MemoryStore,
        service: TaskService,
        alice: User,
        bob: User,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            users.push(
                store
                    .create_user(CreateUser {
                        username: name.to_string(),
                        password_hash: "hash".to_string(),
                    })
                    .await
                    .unwrap(),
            );
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();

        Fixture {
            service: TaskService::new(Arc::new(store.clone())),
            store,
            alice,
            bob,
        }
    }

    fn draft(title: &str, created: NaiveDate, complete: bool) -> CreateTask {
        CreateTask {
            owner_id: None,
            title: title.to_string(),
            description: None,
            complete,
            created: Some(created),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let f = fixture().await;
        let task = f
            .service
            .create(f.alice.id, draft("Alice's", day(), false))
            .await
            .unwrap();

        let mine = f
            .service
            .list_for(f.alice.id, &TaskFilter::default(), day())
            .await
            .unwrap();
        assert_eq!(mine.tasks, vec![task.clone()]);

        let theirs = f
            .service
            .list_for(f.bob.id, &TaskFilter::default(), day())
            .await
            .unwrap();
        assert!(!theirs.tasks.contains(&task));
        assert_eq!(theirs.incomplete_count, 0);
    }

    #[tokio::test]
    async fn test_incomplete_count_ignores_filters() {
        let f = fixture().await;
        let today = day();
        f.service
            .create(f.alice.id, draft("Task 1", today, false))
            .await
            .unwrap();
        f.service
            .create(f.alice.id, draft("Task 2", today - Duration::days(1), false))
            .await
            .unwrap();
        f.service
            .create(f.alice.id, draft("Task 3", today, true))
            .await
            .unwrap();

        let all = f
            .service
            .list_for(f.alice.id, &TaskFilter::default(), today)
            .await
            .unwrap();
        assert_eq!(all.tasks.len(), 3);
        assert_eq!(all.incomplete_count, 2);

        let searched = f
            .service
            .list_for(f.alice.id, &TaskFilter::new(Some("Task 3"), Some("today")), today)
            .await
            .unwrap();
        assert_eq!(searched.tasks.len(), 1);
        assert_eq!(searched.incomplete_count, 2);
    }

    #[tokio::test]
    async fn test_create_forces_owner() {
        let f = fixture().await;
        let mut data = draft("Sneaky", day(), false);
        data.owner_id = Some(f.bob.id);

        let task = f.service.create(f.alice.id, data).await.unwrap();
        assert_eq!(task.owner_id, Some(f.alice.id));
        assert!(f.store.list(f.bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let f = fixture().await;
        let err = f
            .service
            .create(f.alice.id, draft("", day(), false))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = f
            .service
            .create(f.alice.id, draft("   ", day(), false))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(f.store.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_other_owners_task_is_not_found() {
        let f = fixture().await;
        let task = f
            .service
            .create(f.alice.id, draft("Private", day(), false))
            .await
            .unwrap();

        assert!(f
            .service
            .get_detail(f.bob.id, task.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(f
            .service
            .update(
                f.bob.id,
                task.id,
                UpdateTask {
                    title: Some("Hijacked".to_string()),
                    ..Default::default()
                }
            )
            .await
            .unwrap_err()
            .is_not_found());
        assert!(f
            .service
            .delete(f.bob.id, task.id)
            .await
            .unwrap_err()
            .is_not_found());

        let unchanged = f.service.get_detail(f.alice.id, task.id).await.unwrap();
        assert_eq!(unchanged.title, "Private");
    }

    #[tokio::test]
    async fn test_completed_task_stays_mutable() {
        let f = fixture().await;
        let task = f
            .service
            .create(f.alice.id, draft("Done", day(), true))
            .await
            .unwrap();

        let reopened = f
            .service
            .update(
                f.alice.id,
                task.id,
                UpdateTask {
                    complete: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!reopened.complete);

        f.service.delete(f.alice.id, task.id).await.unwrap();
        assert!(f
            .service
            .get_detail(f.alice.id, task.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found() {
        let f = fixture().await;
        assert!(f
            .service
            .get_detail(f.alice.id, 404)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(f
            .service
            .delete(f.alice.id, 404)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
