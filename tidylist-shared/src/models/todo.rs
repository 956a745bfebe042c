/// Todo item model and database operations
///
/// A todo belongs to exactly one list and carries a title, an optional
/// note, a priority, a completion flag with a coupled timestamp, an
/// optional due date, and a position within the owning list. The
/// `completed_at` timestamp is non-null exactly when `is_completed` is
/// true: it is set on the transition to completed and cleared on the
/// transition back. Position maintenance is delegated to the `ordering`
/// module.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE todo_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE todos (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     list_id UUID NOT NULL REFERENCES todo_lists(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     note TEXT,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     completed_at TIMESTAMPTZ,
///     due_date DATE,
///     priority todo_priority NOT NULL DEFAULT 'low',
///     position INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::ordering;

/// Maximum length of a todo title, in characters
pub const TITLE_MAX_LEN: usize = 200;

/// Todo priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "todo_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Default priority for new todos
    #[default]
    Low,
    Medium,
    High,
}

/// Error returned when a priority literal is not recognized
#[derive(Debug, thiserror::Error)]
#[error("priority must be one of 'low', 'medium', or 'high'")]
pub struct InvalidPriority;

impl Priority {
    /// Converts the priority to its database/API string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Lenient parse used when filtering
    ///
    /// Anything other than an exact priority literal (absent, empty,
    /// "all", a typo) means "no filter". Contrast with [`FromStr`],
    /// which is used on create/update and rejects unknown literals.
    pub fn parse_filter(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| v.parse().ok())
    }
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(InvalidPriority),
        }
    }
}

/// Todo item model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    /// Unique todo ID
    pub id: Uuid,

    /// Owning list
    pub list_id: Uuid,

    /// Title (trimmed, non-empty, at most 200 characters)
    pub title: String,

    /// Optional free-form note
    pub note: Option<String>,

    /// Whether the todo is completed
    pub is_completed: bool,

    /// When the todo was completed (non-null iff `is_completed`)
    pub completed_at: Option<DateTime<Utc>>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Priority (defaults to low)
    pub priority: Priority,

    /// Dense rank among the owning list's todos, starting at 0
    pub position: i32,

    /// When the todo was created
    pub created_at: DateTime<Utc>,

    /// When the todo was last mutated (including position shifts)
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new todo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    /// Owning list
    pub list_id: Uuid,

    /// Title (already trimmed and validated)
    pub title: String,

    /// Optional note
    pub note: Option<String>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Priority (defaults to low)
    pub priority: Priority,

    /// Explicit insert index; None appends at the end
    pub position: Option<i32>,
}

/// Input for updating an existing todo
///
/// All fields are optional; only non-None fields are written. Position
/// is deliberately absent; moves go through the ordering engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    /// New title (already trimmed and validated)
    pub title: Option<String>,

    /// New note (use Some(None) to clear)
    pub note: Option<Option<String>>,

    /// New completion state; `completed_at` follows the transition
    pub is_completed: Option<bool>,

    /// New due date (use Some(None) to clear)
    pub due_date: Option<Option<NaiveDate>>,

    /// New priority
    pub priority: Option<Priority>,
}

/// Filter over a list's todos
///
/// Both fields optional; both absent means "return all, in position
/// order". Filtering never re-sorts.
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    /// Case-insensitive title substring; blank is treated as absent
    pub query: Option<String>,

    /// Exact priority match
    pub priority: Option<Priority>,
}

const TODO_COLUMNS: &str = "id, list_id, title, note, is_completed, completed_at, \
                            due_date, priority, position, created_at, updated_at";

/// Row shape for ownership lookups: a todo joined with its list's owner
#[derive(Debug, sqlx::FromRow)]
struct TodoWithOwner {
    id: Uuid,
    list_id: Uuid,
    title: String,
    note: Option<String>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    due_date: Option<NaiveDate>,
    priority: Priority,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_id: Uuid,
}

impl Todo {
    /// Creates a new todo in a list
    ///
    /// The position is allocated by the ordering engine in the same
    /// transaction as the insert.
    pub async fn create(pool: &PgPool, data: CreateTodo) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let position =
            ordering::allocate_position(&mut tx, ordering::LIST_TODOS, data.list_id, data.position)
                .await?;

        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (list_id, title, note, due_date, priority, position) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(data.list_id)
        .bind(data.title)
        .bind(data.note)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(todo)
    }

    /// Finds a todo by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Finds a todo together with the user who transitively owns it
    ///
    /// Ownership is not stored on the todo; it is resolved through the
    /// owning list in one query.
    pub async fn find_with_owner(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<(Self, Uuid)>, sqlx::Error> {
        let row = sqlx::query_as::<_, TodoWithOwner>(
            r#"
            SELECT t.id, t.list_id, t.title, t.note, t.is_completed, t.completed_at,
                   t.due_date, t.priority, t.position, t.created_at, t.updated_at,
                   l.user_id AS owner_id
            FROM todos t
            JOIN todo_lists l ON l.id = t.list_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| {
            let owner_id = r.owner_id;
            (
                Todo {
                    id: r.id,
                    list_id: r.list_id,
                    title: r.title,
                    note: r.note,
                    is_completed: r.is_completed,
                    completed_at: r.completed_at,
                    due_date: r.due_date,
                    priority: r.priority,
                    position: r.position,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                },
                owner_id,
            )
        }))
    }

    /// Lists a list's todos in position order, optionally filtered
    ///
    /// A present, non-blank query retains case-insensitive title
    /// substring matches (LIKE metacharacters are matched literally); a
    /// present priority filters exactly. Filtering never re-sorts: the
    /// retained todos keep their relative position order.
    pub async fn search(
        pool: &PgPool,
        list_id: Uuid,
        filter: &TodoFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {TODO_COLUMNS} FROM todos WHERE list_id = $1");
        let mut bind_count = 1;

        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        if pattern.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND title ILIKE ${} ESCAPE '\\'", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND priority = ${}", bind_count));
        }

        query.push_str(" ORDER BY position ASC, created_at ASC");

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(list_id);

        if let Some(pattern) = pattern {
            q = q.bind(pattern);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }

        let todos = q.fetch_all(pool).await?;

        Ok(todos)
    }

    /// Updates an existing todo
    ///
    /// Only non-None fields in `data` are written. Setting
    /// `is_completed` keeps `completed_at` coupled: the timestamp is set
    /// on a false→true transition, cleared on true→false, and untouched
    /// when the flag doesn't change.
    ///
    /// # Returns
    ///
    /// The updated todo if found, None if the todo doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTodo,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE todos SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.note.is_some() {
            bind_count += 1;
            query.push_str(&format!(", note = ${}", bind_count));
        }
        if data.is_completed.is_some() {
            bind_count += 1;
            // SET expressions see the pre-update row, so is_completed
            // here is the old flag and the CASE detects the transition.
            query.push_str(&format!(
                ", completed_at = CASE \
                     WHEN ${n} = is_completed THEN completed_at \
                     WHEN ${n} THEN NOW() \
                     ELSE NULL \
                 END, is_completed = ${n}",
                n = bind_count
            ));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TODO_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(note) = data.note {
            q = q.bind(note);
        }
        if let Some(is_completed) = data.is_completed {
            q = q.bind(is_completed);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }

        let todo = q.fetch_optional(pool).await?;

        Ok(todo)
    }

    /// Flips the completion flag
    ///
    /// Completing sets `completed_at` to now; un-completing clears it.
    ///
    /// # Returns
    ///
    /// The updated todo if found, None if the todo doesn't exist
    pub async fn toggle_completion(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET \
                 is_completed = NOT is_completed, \
                 completed_at = CASE WHEN is_completed THEN NULL ELSE NOW() END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Deletes a todo by ID
    ///
    /// The remaining todos close the positional gap in the same
    /// transaction.
    ///
    /// # Returns
    ///
    /// True if the todo was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row: Option<(Uuid, i32)> =
            sqlx::query_as("SELECT list_id, position FROM todos WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((list_id, position)) = row else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ordering::close_gap(&mut tx, ordering::LIST_TODOS, list_id, position).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Whether the todo is past its due date and still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < today)
    }

    /// Whether the todo is due exactly today
    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due == today)
    }
}

/// Escapes LIKE metacharacters so a search query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Validates and normalizes a todo title: trimmed, non-empty, at most
/// [`TITLE_MAX_LEN`] characters
pub fn normalize_title(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(format!("Title must be at most {} characters", TITLE_MAX_LEN));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_as_str() {
        assert_eq!(Priority::Low.as_str(), "low");
        assert_eq!(Priority::Medium.as_str(), "medium");
        assert_eq!(Priority::High.as_str(), "high");
    }

    #[test]
    fn test_priority_default_is_low() {
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn test_priority_strict_parse() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);

        // Create/update reject unknown literals
        assert!("urgent".parse::<Priority>().is_err());
        assert!("HIGH".parse::<Priority>().is_err());
        assert!("".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_filter_parse_is_lenient() {
        assert_eq!(Priority::parse_filter(Some("high")), Some(Priority::High));

        // Unknown, empty, or absent all mean "no filter"
        assert_eq!(Priority::parse_filter(Some("urgent")), None);
        assert_eq!(Priority::parse_filter(Some("all")), None);
        assert_eq!(Priority::parse_filter(Some("")), None);
        assert_eq!(Priority::parse_filter(None), None);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("buy"), "buy");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_normalize_title_trims() {
        assert_eq!(normalize_title("  Buy milk  ").unwrap(), "Buy milk");
    }

    #[test]
    fn test_normalize_title_rejects_blank() {
        assert!(normalize_title("   ").is_err());
    }

    #[test]
    fn test_normalize_title_rejects_too_long() {
        let long = "a".repeat(TITLE_MAX_LEN + 1);
        assert!(normalize_title(&long).is_err());
    }

    #[test]
    fn test_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();

        let mut todo = sample_todo();
        todo.due_date = Some(yesterday);
        assert!(todo.is_overdue(today));

        // Completed todos are never overdue
        todo.is_completed = true;
        assert!(!todo.is_overdue(today));

        // No due date, no overdue
        todo.is_completed = false;
        todo.due_date = None;
        assert!(!todo.is_overdue(today));

        // Due today is not overdue
        todo.due_date = Some(today);
        assert!(!todo.is_overdue(today));
        assert!(todo.is_due_today(today));
    }

    fn sample_todo() -> Todo {
        Todo {
            id: Uuid::new_v4(),
            list_id: Uuid::new_v4(),
            title: "Buy milk".to_string(),
            note: None,
            is_completed: false,
            completed_at: None,
            due_date: None,
            priority: Priority::Low,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
