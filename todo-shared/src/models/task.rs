/// Task model and database operations
///
/// This module provides the Task model: a single to-do item owned by a user.
/// Tasks are the only domain entity of the application; users are owned by the
/// authentication layer.
///
/// # Lifecycle
///
/// ```text
/// created → (updated)* → deleted
/// ```
///
/// `complete` is a plain field, not a state: a completed task stays editable and
/// deletable.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     owner_id UUID REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     description TEXT,
///     complete BOOLEAN NOT NULL DEFAULT FALSE,
///     created DATE NOT NULL DEFAULT CURRENT_DATE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use todo_shared::models::task::{Task, CreateTask};
/// use todo_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     owner_id: Some(Uuid::new_v4()),
///     title: "Buy milk".to_string(),
///     description: None,
///     complete: false,
///     created: None,
/// }).await?;
///
/// println!("Created task: {}", task.id);
/// # Ok(())
/// # }
/// ```

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Longest accepted title, in characters
pub const TITLE_MAX_LEN: usize = 100;

const TITLE_MESSAGE: &str = "Title must be 1-100 characters";

/// Title rule: 1 to 100 characters, not only whitespace
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() || title.chars().count() > TITLE_MAX_LEN {
        let mut err = ValidationError::new("title");
        err.message = Some(TITLE_MESSAGE.into());
        return Err(err);
    }
    Ok(())
}

/// Task model representing a single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Store-assigned identifier
    pub id: i64,

    /// Owning user (None for unowned tasks)
    ///
    /// Cascades: deleting the user deletes the task.
    pub owner_id: Option<Uuid>,

    /// Short title, 1 to 100 characters
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Whether the task is done
    pub complete: bool,

    /// Calendar date the task belongs to
    pub created: NaiveDate,
}

/// Input for creating a new task
///
/// `created` defaults to the current local date when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    /// Owning user
    pub owner_id: Option<Uuid>,

    /// Task title
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Completion flag
    #[serde(default)]
    pub complete: bool,

    /// Task date (defaults to today)
    pub created: Option<NaiveDate>,
}

/// Input for updating an existing task
///
/// All fields are optional. Only non-None fields will be updated.
/// The owner is immutable after creation and therefore absent here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    /// New title
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New completion flag
    pub complete: Option<bool>,

    /// New task date
    pub created: Option<NaiveDate>,
}

impl UpdateTask {
    /// Applies the present fields to `task` in place
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(complete) = self.complete {
            task.complete = complete;
        }
        if let Some(created) = self.created {
            task.created = created;
        }
    }
}

/// The current local calendar date
///
/// Callers capture this once per operation and pass it down.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Task {
    /// Creates a new task in the database
    ///
    /// Input is assumed to be validated by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist (foreign key violation)
    /// or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let created = data.created.unwrap_or_else(today);

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_id, title, description, complete, created)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, title, description, complete, created
            "#,
        )
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.complete)
        .bind(created)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    ///
    /// # Returns
    ///
    /// The task if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, complete, created
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists every task of an owner
    ///
    /// Ordered incomplete first, then by ID.
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, complete, created
            FROM tasks
            WHERE owner_id = $1
            ORDER BY complete ASC, id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates an existing task
    ///
    /// Only non-None fields in `data` will be updated.
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the task doesn't exist
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use todo_shared::models::task::{Task, UpdateTask};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let update = UpdateTask {
    ///     complete: Some(true),
    ///     ..Default::default()
    /// };
    ///
    /// if let Some(task) = Task::update(&pool, 42, update).await? {
    ///     println!("Completed: {}", task.title);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }
        if data.complete.is_some() {
            bind_count += 1;
            assignments.push(format!("complete = ${}", bind_count));
        }
        if data.created.is_some() {
            bind_count += 1;
            assignments.push(format!("created = ${}", bind_count));
        }

        // Nothing to change: still report whether the row exists
        if assignments.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 \
             RETURNING id, owner_id, title, description, complete, created",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(complete) = data.complete {
            q = q.bind(complete);
        }
        if let Some(created) = data.created {
            q = q.bind(created);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the task belongs to `user_id`
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}
