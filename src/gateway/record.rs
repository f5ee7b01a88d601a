//! The durable session record: token plus serialized user.
//!
//! Both halves are written together and removed together. Every multi-key
//! operation runs under one lock so a compare-and-purge from the 401 policer
//! cannot interleave with a login writing a fresh record.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use std::sync::Arc;

use envelope::{AuthPayload, User};
use parking_lot::Mutex;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// Storage key of the session token.
pub const SESSION_ID_KEY: &str = "sessionId";
/// Storage key of the JSON-serialized [`User`].
pub const USER_KEY: &str = "user";

/// Outcome of reading the persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredUser {
    Missing,
    Present(User),
    /// An entry existed but did not decode; it has been purged.
    Purged,
}

pub struct SessionRecord {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl SessionRecord {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, lock: Mutex::new(()) }
    }

    /// Persisted session token, if any. Storage failures read as absent.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        let _guard = self.lock.lock();
        self.read(SESSION_ID_KEY)
    }

    /// Persisted user. A malformed entry is removed together with its token
    /// so it cannot poison later reads.
    #[must_use]
    pub fn user(&self) -> StoredUser {
        let _guard = self.lock.lock();
        let Some(raw) = self.read(USER_KEY) else {
            return StoredUser::Missing;
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => StoredUser::Present(user),
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed persisted user record");
                self.remove_all();
                StoredUser::Purged
            }
        }
    }

    /// Write both halves of the record. On failure nothing is left behind.
    ///
    /// # Errors
    ///
    /// Returns the storage error that prevented the write.
    pub fn save(&self, payload: &AuthPayload) -> Result<(), StorageError> {
        let user = serde_json::to_string(&payload.user)?;
        let _guard = self.lock.lock();
        let written = self
            .store
            .set(USER_KEY, &user)
            .and_then(|()| self.store.set(SESSION_ID_KEY, &payload.session_id));
        if written.is_err() {
            self.remove_all();
        }
        written
    }

    /// Remove both halves. Returns whether a token was present.
    pub fn purge(&self) -> bool {
        let _guard = self.lock.lock();
        let had_token = self.read(SESSION_ID_KEY).is_some();
        self.remove_all();
        had_token
    }

    /// Remove the record only if its token is still `token`.
    ///
    /// A 401 carrying an older token must not wipe a session written since.
    pub fn purge_if_current(&self, token: &str) -> bool {
        let _guard = self.lock.lock();
        if self.read(SESSION_ID_KEY).as_deref() != Some(token) {
            return false;
        }
        self.remove_all();
        true
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key, "session storage read failed");
                None
            }
        }
    }

    fn remove_all(&self) {
        for key in [SESSION_ID_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(error = %e, key, "session storage remove failed");
            }
        }
    }
}
