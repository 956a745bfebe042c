/// Database utilities
///
/// This module provides the PostgreSQL connection pool and migration
/// runner used by the API server and the test suite.
///
/// - `pool`: Connection pool creation and health checks
/// - `migrations`: Embedded sqlx migrations

pub mod migrations;
pub mod pool;
