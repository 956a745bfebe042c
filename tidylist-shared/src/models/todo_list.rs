/// Todo list model and database operations
///
/// A list belongs to exactly one user and carries a display name, an
/// optional description, a hex color tag, and a position within the
/// owning user's sidebar. Position maintenance is delegated to the
/// `ordering` module; nothing here writes `position` outside of it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todo_lists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     description TEXT,
///     color VARCHAR(7) NOT NULL DEFAULT '#3b82f6',
///     position INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ordering;

/// Maximum length of a list name, in characters
pub const NAME_MAX_LEN: usize = 100;

/// Color assigned to lists created without one
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Todo list model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TodoList {
    /// Unique list ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Display name (trimmed, non-empty, at most 100 characters)
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Color tag: `#` followed by six hex digits
    pub color: String,

    /// Dense rank among the owning user's lists, starting at 0
    pub position: i32,

    /// When the list was created
    pub created_at: DateTime<Utc>,

    /// When the list was last mutated (including position shifts)
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoList {
    /// Owning user
    pub user_id: Uuid,

    /// Display name (already trimmed and validated)
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Color tag (validated `#rrggbb`)
    pub color: String,

    /// Explicit insert index; None appends at the end
    pub position: Option<i32>,
}

/// Input for updating an existing list
///
/// All fields are optional; only non-None fields are written. Position
/// is deliberately absent; moves go through the ordering engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoList {
    /// New display name (already trimmed and validated)
    pub name: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New color tag
    pub color: Option<String>,
}

impl TodoList {
    /// Creates a new list for a user
    ///
    /// The position is allocated by the ordering engine in the same
    /// transaction as the insert: appended at the end, or slotted at the
    /// requested index with later siblings shifted up.
    pub async fn create(pool: &PgPool, data: CreateTodoList) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let position =
            ordering::allocate_position(&mut tx, ordering::USER_LISTS, data.user_id, data.position)
                .await?;

        let list = sqlx::query_as::<_, TodoList>(
            r#"
            INSERT INTO todo_lists (user_id, name, description, color, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, description, color, position, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.color)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(list)
    }

    /// Finds a list by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let list = sqlx::query_as::<_, TodoList>(
            r#"
            SELECT id, user_id, name, description, color, position, created_at, updated_at
            FROM todo_lists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(list)
    }

    /// Lists all lists owned by a user, in position order
    ///
    /// Equal positions cannot arise through the ordering engine; the
    /// created_at tie-break keeps iteration stable if they ever do.
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let lists = sqlx::query_as::<_, TodoList>(
            r#"
            SELECT id, user_id, name, description, color, position, created_at, updated_at
            FROM todo_lists
            WHERE user_id = $1
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(lists)
    }

    /// Updates an existing list
    ///
    /// Only non-None fields in `data` are written. The `updated_at`
    /// timestamp refreshes on any update.
    ///
    /// # Returns
    ///
    /// The updated list if found, None if the list doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTodoList,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE todo_lists SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.color.is_some() {
            bind_count += 1;
            query.push_str(&format!(", color = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, user_id, name, description, color, position, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, TodoList>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }

        let list = q.fetch_optional(pool).await?;

        Ok(list)
    }

    /// Deletes a list by ID
    ///
    /// All of the list's todos go with it (CASCADE), and the remaining
    /// lists close the positional gap in the same transaction.
    ///
    /// # Returns
    ///
    /// True if the list was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row: Option<(Uuid, i32)> =
            sqlx::query_as("SELECT user_id, position FROM todo_lists WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((user_id, position)) = row else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM todo_lists WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ordering::close_gap(&mut tx, ordering::USER_LISTS, user_id, position).await?;

        tx.commit().await?;
        Ok(true)
    }
}

/// Validates and normalizes a list name: trimmed, non-empty, at most
/// [`NAME_MAX_LEN`] characters
pub fn normalize_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(format!("Name must be at most {} characters", NAME_MAX_LEN));
    }
    Ok(trimmed.to_string())
}

/// Validates a color tag: `#` followed by exactly six hex digits
pub fn validate_color(value: &str) -> Result<(), String> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err("Color must be '#' followed by six hex digits".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_trims() {
        assert_eq!(normalize_name("  Groceries  ").unwrap(), "Groceries");
    }

    #[test]
    fn test_normalize_name_rejects_blank() {
        assert!(normalize_name("").is_err());
        assert!(normalize_name("   ").is_err());
    }

    #[test]
    fn test_normalize_name_rejects_too_long() {
        let long = "a".repeat(NAME_MAX_LEN + 1);
        assert!(normalize_name(&long).is_err());

        let max = "a".repeat(NAME_MAX_LEN);
        assert_eq!(normalize_name(&max).unwrap(), max);
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#3b82f6").is_ok());
        assert!(validate_color("#FF0000").is_ok());

        assert!(validate_color("red").is_err());
        assert!(validate_color("#fff").is_err());
        assert!(validate_color("#3b82f").is_err());
        assert!(validate_color("#3b82f6a").is_err());
        assert!(validate_color("3b82f6#").is_err());
        assert!(validate_color("#3b82fg").is_err());
    }

    #[test]
    fn test_update_todo_list_default_is_empty() {
        let update = UpdateTodoList::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
        assert!(update.color.is_none());
    }
}
