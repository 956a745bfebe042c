/// Todo list endpoints
///
/// CRUD over a user's lists plus the two positional operations: moving
/// one list to a target index and bulk-reordering the whole sidebar.
/// Every access to a specific list goes through the ownership guard;
/// the collection endpoints are scoped to the authenticated user by
/// construction.
///
/// # Endpoints
///
/// - `GET    /v1/lists` - Lists in position order
/// - `POST   /v1/lists` - Create list
/// - `POST   /v1/lists/reorder` - Bulk reorder
/// - `GET    /v1/lists/:id` - Fetch one list
/// - `PUT    /v1/lists/:id` - Update name/description/color
/// - `DELETE /v1/lists/:id` - Delete (cascades to todos)
/// - `POST   /v1/lists/:id/move` - Move to a target index
/// - `GET    /v1/lists/:id/todos` - The list's todos, searchable

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
    routes::{double_option, todos::TodoResponse},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use tidylist_shared::{
    auth::guard,
    models::{
        todo::{Priority, Todo, TodoFilter},
        todo_list::{self, CreateTodoList, TodoList, UpdateTodoList},
    },
    ordering,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Create list request
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Color tag; defaults to the standard list color
    pub color: Option<String>,

    /// Explicit insert index; absent appends at the end
    pub position: Option<i32>,
}

/// Update list request
///
/// Absent fields are left untouched; a null description clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListRequest {
    /// New display name
    pub name: Option<String>,

    /// New description (null clears)
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New color tag
    pub color: Option<String>,
}

/// Move request: the target index within the sibling group
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// Target index; clamped to the valid range
    pub position: i32,
}

/// Bulk reorder request
#[derive(Debug, Deserialize)]
pub struct ReorderListsRequest {
    /// Every list of the user, in the desired order
    pub list_ids: Vec<Uuid>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Whether the entity was deleted
    pub deleted: bool,
}

/// Search/filter query parameters for a list's todos
#[derive(Debug, Default, Deserialize)]
pub struct TodoQuery {
    /// Case-insensitive title substring
    pub q: Option<String>,

    /// Priority literal; anything unrecognized means "no filter"
    pub priority: Option<String>,
}

/// Lists all of the user's lists in position order
pub async fn list_lists(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TodoList>>> {
    let lists = TodoList::list_by_user(&state.db, auth.user_id).await?;
    Ok(Json(lists))
}

/// Creates a new list
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Blank or over-long name, malformed color
pub async fn create_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateListRequest>,
) -> ApiResult<Json<TodoList>> {
    let name = todo_list::normalize_name(&req.name)
        .map_err(|message| ApiError::validation("name", message))?;

    let color = req.color.unwrap_or_else(|| todo_list::DEFAULT_COLOR.to_string());
    todo_list::validate_color(&color).map_err(|message| ApiError::validation("color", message))?;

    let list = TodoList::create(
        &state.db,
        CreateTodoList {
            user_id: auth.user_id,
            name,
            description: req.description,
            color,
            position: req.position,
        },
    )
    .await?;

    Ok(Json(list))
}

/// Fetches a single list
pub async fn get_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TodoList>> {
    let list = guard::authorize_list(&state.db, auth.user_id, id).await?;
    Ok(Json(list))
}

/// Updates a list's name, description, or color
pub async fn update_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateListRequest>,
) -> ApiResult<Json<TodoList>> {
    guard::authorize_list(&state.db, auth.user_id, id).await?;

    let name = match req.name {
        Some(raw) => Some(
            todo_list::normalize_name(&raw)
                .map_err(|message| ApiError::validation("name", message))?,
        ),
        None => None,
    };

    if let Some(color) = req.color.as_deref() {
        todo_list::validate_color(color)
            .map_err(|message| ApiError::validation("color", message))?;
    }

    let list = TodoList::update(
        &state.db,
        id,
        UpdateTodoList {
            name,
            description: req.description,
            color: req.color,
        },
    )
    .await?
    // The guard saw the list; losing it here means a concurrent delete
    .ok_or_else(|| ApiError::NotFound("List not found".to_string()))?;

    Ok(Json(list))
}

/// Deletes a list and all of its todos
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    guard::authorize_list(&state.db, auth.user_id, id).await?;

    let deleted = TodoList::delete(&state.db, id).await?;

    Ok(Json(DeleteResponse { deleted }))
}

/// Moves a list to a target index among the user's lists
pub async fn move_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<TodoList>> {
    guard::authorize_list(&state.db, auth.user_id, id).await?;

    ordering::move_entity(
        &state.db,
        ordering::USER_LISTS,
        auth.user_id,
        id,
        req.position,
    )
    .await?;

    let list = TodoList::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("List not found".to_string()))?;

    Ok(Json(list))
}

/// Applies an explicit full ordering to the user's lists
///
/// The payload must name each of the user's lists exactly once.
pub async fn reorder_lists(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ReorderListsRequest>,
) -> ApiResult<Json<Vec<TodoList>>> {
    ordering::reorder(&state.db, ordering::USER_LISTS, auth.user_id, &req.list_ids).await?;

    let lists = TodoList::list_by_user(&state.db, auth.user_id).await?;
    Ok(Json(lists))
}

/// Lists a list's todos in position order, optionally filtered
///
/// `q` retains case-insensitive title substring matches; `priority`
/// retains one priority when it parses, and filters nothing otherwise.
/// Both absent returns everything through the same path; there is no
/// special case.
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<TodoQuery>,
) -> ApiResult<Json<Vec<TodoResponse>>> {
    guard::authorize_list(&state.db, auth.user_id, id).await?;

    let filter = TodoFilter {
        query: params.q,
        priority: Priority::parse_filter(params.priority.as_deref()),
    };

    let todos = Todo::search(&state.db, id, &filter).await?;

    let today = Utc::now().date_naive();
    let body = todos
        .into_iter()
        .map(|todo| TodoResponse::from_todo(todo, today))
        .collect();

    Ok(Json(body))
}
