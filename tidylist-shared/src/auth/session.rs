/// In-memory session store
///
/// Maps opaque bearer tokens to user identities with a fixed time-to-
/// live. Sessions are created on login, resolved on every authenticated
/// request, and invalidated on logout. An expired entry found during
/// lookup is purged on the spot.
///
/// The store is process-local: restarting the server logs everyone out.
/// That is an accepted simplification, not a bug; hardening this into a
/// multi-instance service would back it with an external expiring
/// key-value store.
///
/// The map sits behind a mutex. Every operation is an O(1) map access,
/// so contention stays negligible at any realistic request rate.
///
/// # Example
///
/// ```
/// use tidylist_shared::auth::session::SessionStore;
/// use uuid::Uuid;
///
/// let store = SessionStore::new();
/// let user_id = Uuid::new_v4();
///
/// let token = store.create(user_id);
/// assert_eq!(store.resolve(&token), Some(user_id));
///
/// store.invalidate(&token);
/// assert_eq!(store.resolve(&token), None);
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Token length in bytes before hex encoding
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Process-wide session token store
///
/// Constructed once at startup and shared across requests behind an
/// `Arc`. Never a global: ownership stays with the application state.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    /// Creates a store with the default one-hour session lifetime
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(1))
    }

    /// Creates a store with an explicit session lifetime
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Creates a session for a user and returns the opaque token
    ///
    /// The token is 32 bytes from the OS CSPRNG, hex-encoded, so it
    /// cannot be guessed or enumerated.
    pub fn create(&self, user_id: Uuid) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let entry = SessionEntry {
            user_id,
            expires_at: Utc::now() + self.ttl,
        };

        self.lock().insert(token.clone(), entry);
        token
    }

    /// Resolves a token to its user identity
    ///
    /// Returns None for unknown tokens. An expired entry is removed
    /// during the lookup and also resolves to None, so expiry and
    /// "never logged in" are indistinguishable to callers.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.lock();

        match sessions.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => Some(entry.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Removes a session unconditionally
    ///
    /// Idempotent: invalidating an unknown or already-expired token is
    /// not an error.
    pub fn invalidate(&self, token: &str) {
        self.lock().remove(token);
    }

    /// Number of sessions currently held, expired entries included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        // A panic while holding this lock leaves the map intact, so a
        // poisoned guard is still safe to use.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let store = SessionStore::new();
        let user_id = Uuid::new_v4();

        let token = store.create(user_id);
        assert_eq!(store.resolve(&token), Some(user_id));
    }

    #[test]
    fn test_tokens_are_unique_and_opaque() {
        let store = SessionStore::new();
        let user_id = Uuid::new_v4();

        let token1 = store.create(user_id);
        let token2 = store.create(user_id);

        assert_ne!(token1, token2);
        assert_eq!(token1.len(), TOKEN_BYTES * 2);
        assert!(token1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_resolve_unknown_token() {
        let store = SessionStore::new();
        assert_eq!(store.resolve("not-a-token"), None);
    }

    #[test]
    fn test_expired_session_is_purged_on_lookup() {
        // Negative TTL: the session is born expired
        let store = SessionStore::with_ttl(Duration::seconds(-1));
        let token = store.create(Uuid::new_v4());
        assert_eq!(store.len(), 1);

        assert_eq!(store.resolve(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let store = SessionStore::new();
        let token = store.create(Uuid::new_v4());

        store.invalidate(&token);
        assert_eq!(store.resolve(&token), None);

        // Second invalidation of the same token is a no-op
        store.invalidate(&token);
        store.invalidate("never-existed");
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let alice_token = store.create(alice);
        let bob_token = store.create(bob);

        store.invalidate(&alice_token);

        assert_eq!(store.resolve(&alice_token), None);
        assert_eq!(store.resolve(&bob_token), Some(bob));
    }
}
