/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout)
/// - `lists`: Todo list CRUD, move, and reorder
/// - `todos`: Todo CRUD, toggle, move, reorder, and search

pub mod auth;
pub mod health;
pub mod lists;
pub mod todos;

use serde::{Deserialize, Deserializer};

/// Distinguishes "field absent" from "field null" in update payloads
///
/// With plain serde both deserialize to None. Fields annotated with
/// `#[serde(default, deserialize_with = "double_option")]` instead see
/// absent → None and null → Some(None), so clients can clear a nullable
/// column by sending null.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
