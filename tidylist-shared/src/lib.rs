//! # Tidylist Shared Library
//!
//! This crate contains the core of the Tidylist service: database models,
//! session-based authentication, ownership checks, and the position
//! ordering engine. It is consumed by the API server and deliberately has
//! no HTTP or rendering dependency.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migration utilities
//! - `auth`: Password hashing, session store, and ownership guard
//! - `ordering`: Dense position index maintenance for sibling groups

pub mod auth;
pub mod db;
pub mod models;
pub mod ordering;

/// Current version of the Tidylist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
