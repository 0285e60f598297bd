//! Session records and the session-store collaborator.
//!
//! The binder never owns sessions; it resolves them through the injected
//! [`SessionResolver`]. The bundled [`SessionStore`] keeps sessions in a
//! concurrent map keyed by an opaque ULID token, so resolution is a pure
//! lookup safe to call from any number of in-flight requests.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use ulid::Ulid;

/// An authenticated caller. The binder only reads this; creation and
/// removal belong to the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub permission: i64,
    pub tags: Vec<String>,
}

/// Resolves an opaque credential to a session record. Injected into the
/// binder at registration time; no caching on the binder side.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Session>;
}

/// In-memory session table.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a session with a fresh opaque token.
    pub fn create(
        &self,
        user_id: i64,
        username: impl Into<String>,
        permission: i64,
        tags: Vec<String>,
    ) -> Session {
        let session = Session {
            token: Ulid::new().to_string(),
            user_id,
            username: username.into(),
            permission,
            tags,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Refresh the tag set on a live session (profile edits take effect
    /// without a re-login).
    pub fn set_tags(&self, token: &str, tags: Vec<String>) {
        if let Some(mut s) = self.sessions.get_mut(token) {
            s.tags = tags;
        }
    }

    /// Revoke every session belonging to `username` (password change,
    /// account deletion).
    pub fn remove_all(&self, username: &str) {
        self.sessions.retain(|_, s| s.username != username);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionResolver for SessionStore {
    fn resolve(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|s| s.value().clone())
    }
}

/// Username-salted sha256 hex digest.
pub fn hash_password(password: &str, username: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(username.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

pub fn is_username_valid(username: &str) -> bool {
    (4..=32).contains(&username.chars().count())
        && username.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_password_valid(password: &str) -> bool {
    password.chars().count() >= 8
}
