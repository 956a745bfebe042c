/// Position ordering engine
///
/// Todos within a list and lists within a user each form a sibling group
/// whose `position` column is a dense, zero-based index: after any
/// completed operation the positions are exactly {0, ..., n-1} with no
/// gaps or duplicates. This module is the only writer of the `position`
/// column; entity update operations never touch it.
///
/// Multi-row position updates (insert-at, move, gap close, bulk reorder)
/// run inside a single transaction so a concurrent reader never observes
/// a partially shifted group. Concurrent reorders of the same group are
/// not serialized beyond that; the last committed transaction wins.
///
/// # Example
///
/// ```no_run
/// use tidylist_shared::ordering;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, list_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Move a list to the top of the user's sidebar
/// ordering::move_entity(&pool, ordering::USER_LISTS, user_id, list_id, 0).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

/// A sibling group domain: which table holds the rows and which column
/// names the shared parent.
///
/// Both scoped tables carry an `updated_at` column; every position shift
/// refreshes it alongside the position itself.
#[derive(Debug, Clone, Copy)]
pub struct SiblingScope {
    table: &'static str,
    parent_column: &'static str,
}

/// Lists owned by a user, ordered in the sidebar
pub const USER_LISTS: SiblingScope = SiblingScope {
    table: "todo_lists",
    parent_column: "user_id",
};

/// Todos within a list
pub const LIST_TODOS: SiblingScope = SiblingScope {
    table: "todos",
    parent_column: "list_id",
};

/// Error type for ordering operations
#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    /// The entity is not part of the sibling group
    #[error("entity is not part of the sibling group")]
    UnknownEntity,

    /// A bulk reorder payload has extra, missing, or duplicate ids
    #[error("reorder payload does not match the current sibling set")]
    SetMismatch,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Counts the members of a sibling group
pub async fn sibling_count(
    conn: &mut PgConnection,
    scope: SiblingScope,
    parent_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM {} WHERE {} = $1",
        scope.table, scope.parent_column
    ))
    .bind(parent_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Allocates the position for a row about to be inserted
///
/// With no requested index the row is appended (`position = count`).
/// A requested index is clamped to [0, count] and the slot is opened by
/// shifting siblings at or above it up by one.
///
/// Callers must run this in the same transaction as the INSERT so the
/// opened slot and the new row become visible together.
pub async fn allocate_position(
    conn: &mut PgConnection,
    scope: SiblingScope,
    parent_id: Uuid,
    requested: Option<i32>,
) -> Result<i32, sqlx::Error> {
    let count = sibling_count(&mut *conn, scope, parent_id).await?;

    let Some(target) = requested else {
        return Ok(count as i32);
    };

    let target = clamp_insert_target(target, count);
    if (target as i64) < count {
        sqlx::query(&format!(
            "UPDATE {} SET position = position + 1, updated_at = NOW() \
             WHERE {} = $1 AND position >= $2",
            scope.table, scope.parent_column
        ))
        .bind(parent_id)
        .bind(target)
        .execute(&mut *conn)
        .await?;
    }

    Ok(target)
}

/// Closes the gap left by a removed row
///
/// Every sibling whose position was greater than the removed row's
/// shifts down by one. Must run in the same transaction as the DELETE.
pub async fn close_gap(
    conn: &mut PgConnection,
    scope: SiblingScope,
    parent_id: Uuid,
    removed_position: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE {} SET position = position - 1, updated_at = NOW() \
         WHERE {} = $1 AND position > $2",
        scope.table, scope.parent_column
    ))
    .bind(parent_id)
    .bind(removed_position)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Moves an entity to a target index within its sibling group
///
/// The target is clamped to [0, count-1]. Siblings strictly between the
/// old and new positions shift by one to close the vacated slot and open
/// the target slot; the moved entity lands exactly at the target. Moving
/// an entity to its current position changes nothing.
///
/// The whole move is one transaction.
///
/// # Errors
///
/// Returns `OrderingError::UnknownEntity` if the entity does not belong
/// to the given parent.
pub async fn move_entity(
    pool: &PgPool,
    scope: SiblingScope,
    parent_id: Uuid,
    entity_id: Uuid,
    target: i32,
) -> Result<(), OrderingError> {
    let mut tx = pool.begin().await?;

    let current: Option<(i32,)> = sqlx::query_as(&format!(
        "SELECT position FROM {} WHERE id = $1 AND {} = $2",
        scope.table, scope.parent_column
    ))
    .bind(entity_id)
    .bind(parent_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (old,) = current.ok_or(OrderingError::UnknownEntity)?;
    let count = sibling_count(&mut tx, scope, parent_id).await?;
    let target = clamp_move_target(target, count);

    match plan_move(old, target) {
        MovePlan::Stay => {
            tx.commit().await?;
            return Ok(());
        }
        MovePlan::TowardFront { target, old } => {
            sqlx::query(&format!(
                "UPDATE {} SET position = position + 1, updated_at = NOW() \
                 WHERE {} = $1 AND position >= $2 AND position < $3",
                scope.table, scope.parent_column
            ))
            .bind(parent_id)
            .bind(target)
            .bind(old)
            .execute(&mut *tx)
            .await?;
        }
        MovePlan::TowardBack { old, target } => {
            sqlx::query(&format!(
                "UPDATE {} SET position = position - 1, updated_at = NOW() \
                 WHERE {} = $1 AND position > $2 AND position <= $3",
                scope.table, scope.parent_column
            ))
            .bind(parent_id)
            .bind(old)
            .bind(target)
            .execute(&mut *tx)
            .await?;
        }
    }

    sqlx::query(&format!(
        "UPDATE {} SET position = $2, updated_at = NOW() WHERE id = $1",
        scope.table
    ))
    .bind(entity_id)
    .bind(target)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Applies an explicit full ordering to a sibling group
///
/// The payload must cover exactly the current sibling set; extra,
/// missing, or duplicate ids are rejected before anything is written.
/// Positions 0..n-1 are assigned in payload order inside one
/// transaction.
pub async fn reorder(
    pool: &PgPool,
    scope: SiblingScope,
    parent_id: Uuid,
    ordered_ids: &[Uuid],
) -> Result<(), OrderingError> {
    let mut tx = pool.begin().await?;

    let rows: Vec<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE {} = $1",
        scope.table, scope.parent_column
    ))
    .bind(parent_id)
    .fetch_all(&mut *tx)
    .await?;

    let current: Vec<Uuid> = rows.into_iter().map(|(id,)| id).collect();
    validate_reorder(&current, ordered_ids)?;

    for (index, id) in ordered_ids.iter().enumerate() {
        sqlx::query(&format!(
            "UPDATE {} SET position = $2, updated_at = NOW() WHERE id = $1",
            scope.table
        ))
        .bind(id)
        .bind(index as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Clamps a move target to the valid index range [0, count-1]
fn clamp_move_target(target: i32, count: i64) -> i32 {
    let max = (count - 1).max(0) as i32;
    target.clamp(0, max)
}

/// Clamps an insert target to [0, count] (count = append)
fn clamp_insert_target(target: i32, count: i64) -> i32 {
    target.clamp(0, count as i32)
}

/// The sibling shifts a move requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MovePlan {
    /// Target equals the current position; nothing moves
    Stay,

    /// Moving toward the front: siblings in [target, old) shift up by one
    TowardFront { target: i32, old: i32 },

    /// Moving toward the back: siblings in (old, target] shift down by one
    TowardBack { old: i32, target: i32 },
}

fn plan_move(old: i32, target: i32) -> MovePlan {
    use std::cmp::Ordering;

    match target.cmp(&old) {
        Ordering::Equal => MovePlan::Stay,
        Ordering::Less => MovePlan::TowardFront { target, old },
        Ordering::Greater => MovePlan::TowardBack { old, target },
    }
}

/// Validates a bulk-reorder payload against the current sibling set
fn validate_reorder(current: &[Uuid], proposed: &[Uuid]) -> Result<(), OrderingError> {
    if proposed.len() != current.len() {
        return Err(OrderingError::SetMismatch);
    }

    let current_set: HashSet<Uuid> = current.iter().copied().collect();
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(proposed.len());

    for id in proposed {
        if !current_set.contains(id) || !seen.insert(*id) {
            return Err(OrderingError::SetMismatch);
        }
    }

    Ok(())
}
