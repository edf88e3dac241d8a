use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "access_token";

/// Storage key for the cached account email
pub const EMAIL_KEY: &str = "user_email";

/// Storage key for the cached date of birth
pub const DOB_KEY: &str = "user_dob";

/// Storage key for the cached gender
pub const GENDER_KEY: &str = "user_gender";

/// Every key owned by the session. Logout clears all of them together.
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, EMAIL_KEY, DOB_KEY, GENDER_KEY];

/// Cached profile fields. Missing values read back as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub dob: String,
    pub gender: String,
}

/// Synchronous key-value access to the session fields.
///
/// Implementors provide `get`, `set_many` and `clear`; everything the rest of the
/// crate needs is built on those. None of the methods fail: an unavailable
/// backing store degrades to in-memory state for the rest of the process.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store several values as one step, so readers see all or none of them
    fn set_many(&self, entries: &[(&str, &str)]);

    /// Remove every key in `SESSION_KEYS` as one step. Readers never see a
    /// partially cleared session.
    fn clear(&self);

    /// True iff a non-empty token is stored
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Get the bearer token. An empty stored token counts as absent.
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn set(&self, key: &str, value: &str) {
        self.set_many(&[(key, value)]);
    }

    fn set_token(&self, token: &str) {
        self.set(TOKEN_KEY, token);
    }

    /// Log out: drop the token along with every cached profile field
    fn remove_token(&self) {
        self.clear();
    }

    fn set_user_email(&self, email: &str) {
        self.set(EMAIL_KEY, email);
    }

    fn user_email(&self) -> Option<String> {
        self.get(EMAIL_KEY)
    }

    fn set_user_profile(&self, dob: &str, gender: &str) {
        self.set_many(&[(DOB_KEY, dob), (GENDER_KEY, gender)]);
    }

    fn user_profile(&self) -> UserProfile {
        UserProfile {
            dob: self.get(DOB_KEY).unwrap_or_default(),
            gender: self.get(GENDER_KEY).unwrap_or_default(),
        }
    }
}

/// Session store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map of strings
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) {
        let mut values = self.values();
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
    }

    fn clear(&self) {
        let mut values = self.values();
        for key in SESSION_KEYS {
            values.remove(key);
        }
    }
}
