//! Account model and in-memory user store

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::webauthn::types::Credential;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// A registered account and its enrolled passkeys
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub credentials: Vec<Credential>,
}

impl User {
    #[must_use]
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
            credentials: Vec::new(),
        }
    }

    /// Insert or replace a credential by ID.
    ///
    /// A re-registration of the same authenticator replaces the old entry
    /// instead of accumulating duplicates.
    pub fn upsert_credential(&mut self, credential: Credential) {
        if let Some(existing) = self
            .credentials
            .iter_mut()
            .find(|cred| cred.id == credential.id)
        {
            *existing = credential;
        } else {
            self.credentials.push(credential);
        }
    }
}

/// Thread-safe in-memory account store, keyed by user ID with an email
/// index. An explicit object handed to the handlers as shared state.
pub struct UserStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

impl UserStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// Look up an account by email, creating it if absent.
    ///
    /// # Panics
    /// Panics if the store mutex is poisoned.
    pub fn find_or_create_by_email(&self, email: &str) -> User {
        let mut inner = self.inner.lock().expect("user store lock poisoned");
        if let Some(id) = inner.by_email.get(email) {
            return inner.users[id].clone();
        }
        let user = User::new(email);
        inner.by_email.insert(email.to_string(), user.id);
        inner.users.insert(user.id, user.clone());
        user
    }

    /// # Panics
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        let id = inner.by_email.get(email)?;
        inner.users.get(id).cloned()
    }

    /// # Panics
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn get_by_id(&self, id: Uuid) -> Option<User> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        inner.users.get(&id).cloned()
    }

    /// Write back a modified account. Accounts are created through
    /// `find_or_create_by_email`; an unknown ID here is a caller bug and
    /// is ignored with a warning.
    ///
    /// # Panics
    /// Panics if the store mutex is poisoned.
    pub fn update(&self, user: User) {
        let mut inner = self.inner.lock().expect("user store lock poisoned");
        if inner.users.contains_key(&user.id) {
            inner.by_email.insert(user.email.clone(), user.id);
            inner.users.insert(user.id, user);
        } else {
            log::warn!("update for unknown user {} dropped", user.id);
        }
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(id: &[u8], sign_count: u32) -> Credential {
        let now = Utc::now();
        Credential {
            id: id.to_vec(),
            public_key: vec![1, 2, 3],
            attestation_type: "none".to_string(),
            transports: vec!["internal".to_string()],
            sign_count,
            created_at: now,
            last_used_at: now,
        }
    }

    #[test]
    fn find_or_create_is_idempotent_per_email() {
        let store = UserStore::new();
        let first = store.find_or_create_by_email("alice@example.test");
        let second = store.find_or_create_by_email("alice@example.test");
        let other = store.find_or_create_by_email("bob@example.test");

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn get_by_email_misses_unknown_accounts() {
        let store = UserStore::new();
        assert!(store.get_by_email("nobody@example.test").is_none());
    }

    #[test]
    fn update_persists_credential_changes() {
        let store = UserStore::new();
        let mut user = store.find_or_create_by_email("alice@example.test");
        user.upsert_credential(credential(b"cred-1", 0));
        store.update(user.clone());

        let reloaded = store.get_by_id(user.id).expect("user exists");
        assert_eq!(reloaded.credentials.len(), 1);
        assert_eq!(reloaded.credentials[0].id, b"cred-1");
    }

    #[test]
    fn upsert_replaces_a_re_registered_credential() {
        let mut user = User::new("alice@example.test");
        user.upsert_credential(credential(b"cred-1", 0));
        user.upsert_credential(credential(b"cred-2", 0));
        user.upsert_credential(credential(b"cred-1", 9));

        assert_eq!(user.credentials.len(), 2);
        let replaced = user
            .credentials
            .iter()
            .find(|cred| cred.id == b"cred-1")
            .expect("credential present");
        assert_eq!(replaced.sign_count, 9);
    }

    #[test]
    fn update_for_unknown_user_is_dropped() {
        let store = UserStore::new();
        let stray = User::new("stray@example.test");
        store.update(stray.clone());

        assert!(store.get_by_id(stray.id).is_none());
    }
}
