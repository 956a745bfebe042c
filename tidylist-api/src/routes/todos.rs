/// Todo item endpoints
///
/// CRUD over todos plus completion toggling and the positional
/// operations. Creating a todo authorizes the target list; every other
/// endpoint authorizes the todo itself through its owning list.
///
/// # Endpoints
///
/// - `POST   /v1/todos` - Create todo
/// - `POST   /v1/todos/reorder` - Bulk reorder within a list
/// - `GET    /v1/todos/:id` - Fetch one todo
/// - `PUT    /v1/todos/:id` - Update fields
/// - `DELETE /v1/todos/:id` - Delete
/// - `POST   /v1/todos/:id/toggle` - Flip completion
/// - `POST   /v1/todos/:id/move` - Move to a target index

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
    routes::{double_option, lists::DeleteResponse, lists::MoveRequest},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use tidylist_shared::{
    auth::guard,
    models::todo::{self, CreateTodo, Priority, Todo, UpdateTodo},
    ordering,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Create todo request
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    /// List to create the todo in
    pub list_id: Uuid,

    /// Title
    pub title: String,

    /// Optional note
    pub note: Option<String>,

    /// Optional due date (YYYY-MM-DD)
    pub due_date: Option<NaiveDate>,

    /// Priority literal; absent defaults to "low", unknown is rejected
    pub priority: Option<String>,

    /// Explicit insert index; absent appends at the end
    pub position: Option<i32>,
}

/// Update todo request
///
/// Absent fields are left untouched; null note/due_date clears them.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    /// New title
    pub title: Option<String>,

    /// New note (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,

    /// New completion state
    pub is_completed: Option<bool>,

    /// New due date (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    /// New priority literal; unknown is rejected
    pub priority: Option<String>,
}

/// Bulk reorder request
#[derive(Debug, Deserialize)]
pub struct ReorderTodosRequest {
    /// The list whose todos are being reordered
    pub list_id: Uuid,

    /// Every todo of the list, in the desired order
    pub todo_ids: Vec<Uuid>,
}

/// Todo as returned by the API
///
/// The model plus the due-date flags the client renders badges from.
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    /// Todo ID
    pub id: Uuid,

    /// Owning list
    pub list_id: Uuid,

    /// Title
    pub title: String,

    /// Note
    pub note: Option<String>,

    /// Completion flag
    pub is_completed: bool,

    /// When the todo was completed (non-null iff completed)
    pub completed_at: Option<DateTime<Utc>>,

    /// Due date
    pub due_date: Option<NaiveDate>,

    /// Priority
    pub priority: Priority,

    /// Position within the list
    pub position: i32,

    /// Past due and still open
    pub is_overdue: bool,

    /// Due exactly today
    pub is_due_today: bool,

    /// Created at
    pub created_at: DateTime<Utc>,

    /// Updated at
    pub updated_at: DateTime<Utc>,
}

impl TodoResponse {
    /// Builds the response shape from a model, evaluating the due-date
    /// flags against the given day
    pub fn from_todo(todo: Todo, today: NaiveDate) -> Self {
        let is_overdue = todo.is_overdue(today);
        let is_due_today = todo.is_due_today(today);

        Self {
            id: todo.id,
            list_id: todo.list_id,
            title: todo.title,
            note: todo.note,
            is_completed: todo.is_completed,
            completed_at: todo.completed_at,
            due_date: todo.due_date,
            priority: todo.priority,
            position: todo.position,
            is_overdue,
            is_due_today,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

fn todo_response(todo: Todo) -> Json<TodoResponse> {
    Json(TodoResponse::from_todo(todo, Utc::now().date_naive()))
}

/// Parses a priority literal from a create/update payload
///
/// Unknown literals are a validation error here, unlike filtering,
/// where they mean "no filter".
fn parse_priority(raw: &str) -> ApiResult<Priority> {
    raw.parse()
        .map_err(|e: todo::InvalidPriority| ApiError::validation("priority", e.to_string()))
}

/// Creates a new todo in a list the user owns
///
/// # Errors
///
/// - `403 Forbidden` / `404 Not Found`: List is foreign or absent
/// - `422 Unprocessable Entity`: Blank or over-long title, unknown priority
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    guard::authorize_list(&state.db, auth.user_id, req.list_id).await?;

    let title = todo::normalize_title(&req.title)
        .map_err(|message| ApiError::validation("title", message))?;

    let priority = match req.priority.as_deref() {
        Some(raw) => parse_priority(raw)?,
        None => Priority::default(),
    };

    let created = Todo::create(
        &state.db,
        CreateTodo {
            list_id: req.list_id,
            title,
            note: req.note,
            due_date: req.due_date,
            priority,
            position: req.position,
        },
    )
    .await?;

    Ok(todo_response(created))
}

/// Fetches a single todo
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TodoResponse>> {
    let todo = guard::authorize_todo(&state.db, auth.user_id, id).await?;
    Ok(todo_response(todo))
}

/// Updates a todo's fields
///
/// Setting `is_completed` keeps `completed_at` coupled to the
/// transition. Position is not updatable here; use the move endpoint.
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    guard::authorize_todo(&state.db, auth.user_id, id).await?;

    let title = match req.title {
        Some(raw) => Some(
            todo::normalize_title(&raw).map_err(|message| ApiError::validation("title", message))?,
        ),
        None => None,
    };

    let priority = match req.priority.as_deref() {
        Some(raw) => Some(parse_priority(raw)?),
        None => None,
    };

    let updated = Todo::update(
        &state.db,
        id,
        UpdateTodo {
            title,
            note: req.note,
            is_completed: req.is_completed,
            due_date: req.due_date,
            priority,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;

    Ok(todo_response(updated))
}

/// Flips a todo's completion flag
///
/// Completing stamps `completed_at`; un-completing clears it.
pub async fn toggle_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TodoResponse>> {
    guard::authorize_todo(&state.db, auth.user_id, id).await?;

    let todo = Todo::toggle_completion(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;

    Ok(todo_response(todo))
}

/// Deletes a todo
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    guard::authorize_todo(&state.db, auth.user_id, id).await?;

    let deleted = Todo::delete(&state.db, id).await?;

    Ok(Json(DeleteResponse { deleted }))
}

/// Moves a todo to a target index within its list
pub async fn move_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<TodoResponse>> {
    let todo = guard::authorize_todo(&state.db, auth.user_id, id).await?;

    ordering::move_entity(
        &state.db,
        ordering::LIST_TODOS,
        todo.list_id,
        id,
        req.position,
    )
    .await?;

    let moved = Todo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;

    Ok(todo_response(moved))
}

/// Applies an explicit full ordering to a list's todos
///
/// The payload must name each todo of the list exactly once.
pub async fn reorder_todos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ReorderTodosRequest>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    guard::authorize_list(&state.db, auth.user_id, req.list_id).await?;

    ordering::reorder(&state.db, ordering::LIST_TODOS, req.list_id, &req.todo_ids).await?;

    let todos = Todo::search(&state.db, req.list_id, &Default::default()).await?;

    let today = Utc::now().date_naive();
    let body = todos
        .into_iter()
        .map(|todo| TodoResponse::from_todo(todo, today))
        .collect();

    Ok(Json(body))
}
