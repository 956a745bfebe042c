/// Authentication and authorization utilities
///
/// This module provides the pieces between "a request arrived" and "a
/// user may touch this entity":
///
/// - `password`: Argon2id password hashing and verification
/// - `session`: In-memory session token store with expiry
/// - `guard`: Transitive-ownership checks for lists and todos

pub mod guard;
pub mod password;
pub mod session;
