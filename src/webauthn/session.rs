//! In-flight ceremony session store
//!
//! Holds `SessionData` between `begin_*` and `finish_*` under an opaque,
//! unguessable identifier. Entries are single-use: `take` removes the
//! entry atomically, so concurrent finishes race to exactly one winner.
//! Entries past the TTL are treated as absent and swept lazily on save.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::crypto;
use super::errors::WebAuthnError;
use super::types::SessionData;

/// Default ceremony TTL (five minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A pending ceremony: which stored user started it, plus engine state
#[derive(Clone, Debug)]
pub struct PendingCeremony {
    pub user_id: String,
    pub data: SessionData,
}

struct Entry {
    ceremony: PendingCeremony,
    stored_at: Instant,
}

/// Shared store for all in-flight ceremonies
pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a pending ceremony and return its session identifier.
    ///
    /// The identifier is 32 fresh random bytes, distinct from the
    /// ceremony challenge.
    ///
    /// # Errors
    /// Returns `RandomSourceFailure` if the OS random source fails.
    ///
    /// # Panics
    /// Panics if the store mutex is poisoned.
    pub fn save(&self, ceremony: PendingCeremony) -> Result<String, WebAuthnError> {
        let id = URL_SAFE_NO_PAD.encode(crypto::random_bytes(32)?);
        let mut entries = self.entries.lock().expect("session store lock poisoned");
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            id.clone(),
            Entry {
                ceremony,
                stored_at: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Remove and return the ceremony for `id`, if present and unexpired.
    ///
    /// Consumes the entry: a second call with the same identifier returns
    /// `None`, as does any call after the TTL.
    ///
    /// # Panics
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn take(&self, id: &str) -> Option<PendingCeremony> {
        let mut entries = self.entries.lock().expect("session store lock poisoned");
        let entry = entries.remove(id)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.ceremony)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webauthn::types::UserVerificationRequirement;
    use std::sync::Arc;

    fn ceremony() -> PendingCeremony {
        PendingCeremony {
            user_id: "user-1".to_string(),
            data: SessionData {
                challenge: vec![9; 32],
                user_id: b"user-1".to_vec(),
                rp_id: "example.test".to_string(),
                origin: "https://example.test".to_string(),
                allowed_credential_ids: Vec::new(),
                user_verification: UserVerificationRequirement::Required,
            },
        }
    }

    #[test]
    fn take_is_single_use() {
        let store = SessionStore::default();
        let id = store.save(ceremony()).expect("save");

        assert!(store.take(&id).is_some());
        assert!(store.take(&id).is_none());
    }

    #[test]
    fn session_ids_differ_from_challenges_and_each_other() {
        let store = SessionStore::default();
        let first = store.save(ceremony()).expect("save");
        let second = store.save(ceremony()).expect("save");

        assert_ne!(first, second);
        let challenge = URL_SAFE_NO_PAD.encode(vec![9u8; 32]);
        assert_ne!(first, challenge);
    }

    #[test]
    fn expired_sessions_report_not_found() {
        let store = SessionStore::new(Duration::from_millis(10));
        let id = store.save(ceremony()).expect("save");

        std::thread::sleep(Duration::from_millis(25));
        assert!(store.take(&id).is_none());
    }

    #[test]
    fn expired_entries_are_swept_on_save() {
        let store = SessionStore::new(Duration::from_millis(10));
        let stale = store.save(ceremony()).expect("save");
        std::thread::sleep(Duration::from_millis(25));

        let fresh = store.save(ceremony()).expect("save");
        let entries = store.entries.lock().expect("lock");
        assert!(!entries.contains_key(&stale));
        assert!(entries.contains_key(&fresh));
    }

    #[test]
    fn concurrent_takes_have_exactly_one_winner() {
        let store = Arc::new(SessionStore::default());
        let id = store.save(ceremony()).expect("save");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = id.clone();
                std::thread::spawn(move || store.take(&id).is_some())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread join"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
