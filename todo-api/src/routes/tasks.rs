/// Task endpoints
///
/// Every handler runs behind the session guard and acts for the signed-in
/// user only; another user's task answers 404.
///
/// # Endpoints
///
/// - `GET  /` - List tasks (`search-title`, `filter-option` query parameters)
/// - `GET  /tasks/:id/` - Task detail
/// - `GET  /tasks/create/` - Empty task form
/// - `POST /tasks/create/` - Create task, redirect to `/`
/// - `GET  /tasks/update/:id/` - Task form with current values
/// - `POST /tasks/update/:id/` - Update task, redirect to `/`
/// - `GET  /tasks/delete/:id/` - Delete confirmation
/// - `POST /tasks/delete/:id/` - Delete task, redirect to `/`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Extension, Form, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use todo_shared::{
    auth::middleware::AuthContext,
    filter::{FilterOption, TaskFilter},
    models::task::{validate_title, CreateTask, Task, UpdateTask},
};

/// Where every successful form post lands
pub const TASK_LIST_PATH: &str = "/";

/// Editable task fields, in form order
pub const TASK_FORM_FIELDS: [&str; 4] = ["title", "description", "complete", "created"];

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "search-title")]
    pub search_title: Option<String>,

    #[serde(rename = "filter-option")]
    pub filter_option: Option<String>,
}

/// Task list page
#[derive(Debug, Serialize)]
pub struct TaskListContext {
    /// Visible tasks, incomplete first
    pub tasks: Vec<Task>,

    /// Incomplete tasks across the whole list, ignoring search and filter
    pub count: usize,

    /// Active search term
    pub search_title: Option<String>,

    /// Active date bucket
    pub filter_option: Option<FilterOption>,
}

/// Task detail and delete confirmation page
#[derive(Debug, Serialize)]
pub struct TaskContext {
    pub task: Task,
}

/// Create and update form page
#[derive(Debug, Serialize)]
pub struct TaskFormContext {
    pub fields: [&'static str; 4],

    /// Current values when editing
    pub task: Option<Task>,
}

/// Submitted task form
///
/// Every field arrives as text, as an HTML form posts it.
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub complete: Option<String>,
    pub created: Option<String>,
}

/// Parsed task form values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub complete: bool,

    /// None when the field was left blank
    pub created: Option<NaiveDate>,
}

impl TaskForm {
    /// Normalises the raw form
    ///
    /// Title and description are trimmed and an empty description is stored
    /// as absent. A bad date and a bad title are reported together.
    pub fn parse(self) -> ApiResult<TaskFields> {
        let mut errors = Vec::new();

        let title = self.title.unwrap_or_default().trim().to_string();

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let complete = checkbox_value(self.complete.as_deref());

        let created = match self.created.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(ValidationErrorDetail::new("created", "Enter a valid date."));
                    None
                }
            },
        };

        if let Err(err) = validate_title(&title) {
            let message = err
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            errors.push(ValidationErrorDetail::new("title", message));
        }

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(TaskFields {
            title,
            description,
            complete,
            created,
        })
    }
}

/// HTML checkbox semantics: unchecked boxes are omitted from the post
pub fn checkbox_value(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None => false,
        Some(value) => !matches!(
            value.to_ascii_lowercase().as_str(),
            "" | "false" | "0" | "off"
        ),
    }
}

impl From<TaskFields> for CreateTask {
    fn from(fields: TaskFields) -> Self {
        CreateTask {
            owner_id: None,
            title: fields.title,
            description: fields.description,
            complete: fields.complete,
            created: fields.created,
        }
    }
}

/// The form replaces title, description and the flag; a blank date keeps the stored one
impl From<TaskFields> for UpdateTask {
    fn from(fields: TaskFields) -> Self {
        UpdateTask {
            title: Some(fields.title),
            description: Some(fields.description),
            complete: Some(fields.complete),
            created: fields.created,
        }
    }
}

/// Lists the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TaskListContext>> {
    let filter = TaskFilter::new(query.search_title.as_deref(), query.filter_option.as_deref());

    let listing = state
        .tasks
        .list_for(auth.user_id, &filter, state.today())
        .await?;

    Ok(Json(TaskListContext {
        tasks: listing.tasks,
        count: listing.incomplete_count,
        search_title: filter.search_title,
        filter_option: filter.option,
    }))
}

/// Shows one task
pub async fn task_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskContext>> {
    let task = state.tasks.get_detail(auth.user_id, id).await?;
    Ok(Json(TaskContext { task }))
}

/// Empty create form
pub async fn create_form() -> Json<TaskFormContext> {
    Json(TaskFormContext {
        fields: TASK_FORM_FIELDS,
        task: None,
    })
}

/// Creates a task owned by the caller
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<TaskForm>,
) -> ApiResult<Redirect> {
    let fields = form.parse()?;
    state.tasks.create(auth.user_id, fields.into()).await?;

    Ok(Redirect::to(TASK_LIST_PATH))
}

/// Update form with the task's current values
pub async fn update_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskFormContext>> {
    let task = state.tasks.get_detail(auth.user_id, id).await?;

    Ok(Json(TaskFormContext {
        fields: TASK_FORM_FIELDS,
        task: Some(task),
    }))
}

/// Updates one of the caller's tasks
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> ApiResult<Redirect> {
    let fields = form.parse()?;
    state.tasks.update(auth.user_id, id, fields.into()).await?;

    Ok(Redirect::to(TASK_LIST_PATH))
}

/// Delete confirmation
pub async fn delete_confirm(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskContext>> {
    let task = state.tasks.get_detail(auth.user_id, id).await?;
    Ok(Json(TaskContext { task }))
}

/// Deletes one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    state.tasks.delete(auth.user_id, id).await?;
    Ok(Redirect::to(TASK_LIST_PATH))
}
