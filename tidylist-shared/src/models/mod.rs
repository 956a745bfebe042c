/// Database models for Tidylist
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `todo_list`: Named, colored, user-owned lists
/// - `todo`: Ordered to-do items within a list
///
/// # Ownership chain
///
/// ```text
/// User 1─* TodoList 1─* Todo
/// ```
///
/// Deletes cascade down the chain. A todo's owner is the owner of its
/// list; ownership is never stored redundantly.

pub mod todo;
pub mod todo_list;
pub mod user;
