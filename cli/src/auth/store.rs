//! The credential store: single source of truth for session tokens.
//!
//! Reads are synchronous snapshots and never touch storage. Every mutation
//! writes through to the configured [`CredentialBackend`]. Persistence
//! failures are logged; the in-memory state stays authoritative for the
//! rest of the process.

use std::sync::{Mutex, PoisonError, RwLock};

use crate::auth::credentials::CredentialBackend;
use crate::auth::tokens::AuthState;

/// Process-wide session state with write-through persistence.
///
/// Shared by `Arc` between the API client middleware and the command layer.
pub struct AuthStore {
    state: RwLock<AuthState>,
    // Serializes writers so the persisted order matches the in-memory order
    // without making readers wait on I/O.
    write_lock: Mutex<()>,
    backend: Box<dyn CredentialBackend>,
}

impl AuthStore {
    /// Rehydrates the store from `backend`.
    ///
    /// An empty slot yields an empty store. An unreadable record is logged
    /// and also yields an empty store.
    #[must_use]
    pub fn open(backend: Box<dyn CredentialBackend>) -> Self {
        let state = match backend.load() {
            Ok(Some(record)) => {
                tracing::debug!("Rehydrated session from storage");
                record.normalized()
            }
            Ok(None) => AuthState::default(),
            Err(e) => {
                tracing::warn!("Ignoring stored session: {e}");
                AuthState::default()
            }
        };

        Self {
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
            backend,
        }
    }

    /// An empty store that persists nowhere.
    #[cfg(test)]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Box::new(crate::auth::credentials::MemoryBackend::default()))
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    /// Whether a session is established.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated
    }

    /// Stores a freshly issued token pair (login, registration).
    pub fn set_auth(&self, access_token: impl Into<String>, refresh_token: impl Into<String>) {
        let next = AuthState::authenticated(access_token.into(), Some(refresh_token.into()));
        self.replace(next, false);
    }

    /// Stores the outcome of a refresh.
    ///
    /// The refresh token is replaced only when the server rotated it.
    pub fn update_access(&self, access_token: impl Into<String>, refresh_token: Option<String>) {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let refresh_token = refresh_token.or_else(|| state.refresh_token.take());
            *state = AuthState::authenticated(access_token.into(), refresh_token);
            state.clone()
        };
        self.persist(&snapshot);
    }

    /// Removes both tokens (logout).
    pub fn clear(&self) {
        self.replace(AuthState::default(), true);
    }

    fn replace(&self, next: AuthState, delete: bool) {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();

        if delete {
            if let Err(e) = self.backend.delete() {
                tracing::warn!("Failed to remove stored session: {e}");
            }
        } else {
            self.persist(&next);
        }
    }

    fn persist(&self, snapshot: &AuthState) {
        if let Err(e) = self.backend.save(snapshot) {
            tracing::warn!("Failed to persist session: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{FileBackend, MockCredentialBackend};
    use crate::error::StaybookError;
    use tempfile::TempDir;

    #[test]
    fn new_store_is_empty() {
        let store = AuthStore::in_memory();
        assert_eq!(store.state(), AuthState::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn set_auth_then_state_returns_both_tokens() {
        let store = AuthStore::in_memory();
        store.set_auth("a", "r");

        let state = store.state();
        assert_eq!(state.access_token.as_deref(), Some("a"));
        assert_eq!(state.refresh_token.as_deref(), Some("r"));
        assert!(state.is_authenticated);
    }

    #[test]
    fn clear_removes_everything() {
        let store = AuthStore::in_memory();
        store.set_auth("a", "r");
        store.clear();

        let state = store.state();
        assert_eq!(state.access_token, None);
        assert_eq!(state.refresh_token, None);
        assert!(!state.is_authenticated);
    }

    #[test]
    fn update_access_keeps_refresh_token_unless_rotated() {
        let store = AuthStore::in_memory();
        store.set_auth("a1", "r1");

        store.update_access("a2", None);
        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.state().refresh_token.as_deref(), Some("r1"));

        store.update_access("a3", Some("r2".to_string()));
        assert_eq!(store.state().refresh_token.as_deref(), Some("r2"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn mutations_write_through_and_rehydrate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth-storage.json");

        let store = AuthStore::open(Box::new(FileBackend::at(path.clone())));
        store.set_auth("a", "r");
        drop(store);

        let reopened = AuthStore::open(Box::new(FileBackend::at(path.clone())));
        assert_eq!(
            reopened.state(),
            AuthState::authenticated("a".to_string(), Some("r".to_string()))
        );

        reopened.clear();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_record_yields_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth-storage.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = AuthStore::open(Box::new(FileBackend::at(path)));
        assert_eq!(store.state(), AuthState::default());
    }

    #[test]
    fn persistence_failure_keeps_memory_state() {
        let mut backend = MockCredentialBackend::new();
        backend.expect_load().returning(|| Ok(None));
        backend
            .expect_save()
            .times(1)
            .returning(|_| Err(StaybookError::CredentialStorage("locked".to_string())));

        let store = AuthStore::open(Box::new(backend));
        store.set_auth("a", "r");

        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("a"));
    }

    #[test]
    fn clear_deletes_the_slot() {
        let mut backend = MockCredentialBackend::new();
        backend
            .expect_load()
            .returning(|| Ok(Some(AuthState::authenticated("a".to_string(), None))));
        backend.expect_delete().times(1).returning(|| Ok(()));

        let store = AuthStore::open(Box::new(backend));
        assert!(store.is_authenticated());

        store.clear();
        assert!(!store.is_authenticated());
    }
}
