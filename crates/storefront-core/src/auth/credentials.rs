use std::collections::HashMap;

use anyhow::{Context, Result};
use keyring::Entry;

use super::persistent::SessionBackend;
use super::session::SESSION_KEYS;

const SERVICE_NAME: &str = "storefront";

/// One stored secret per session key
trait SecretSlots: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing slot is not an error
    fn delete(&self, key: &str) -> Result<()>;
}

/// Slots backed by OS keychain entries under one service name
struct KeychainSlots;

impl KeychainSlots {
    fn entry(key: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")
    }
}

impl SecretSlots for KeychainSlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session from keychain"),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::entry(key)?
            .set_password(value)
            .context("Failed to store session in keychain")
    }

    fn delete(&self, key: &str) -> Result<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}

/// Session values stored in the OS keychain, one entry per session key
pub struct KeyringBackend {
    slots: Box<dyn SecretSlots>,
}

impl KeyringBackend {
    pub fn new() -> Self {
        Self {
            slots: Box::new(KeychainSlots),
        }
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBackend for KeyringBackend {
    fn load(&self) -> Result<HashMap<String, String>> {
        let mut values = HashMap::new();
        for key in SESSION_KEYS {
            if let Some(value) = self.slots.get(key)? {
                values.insert(key.to_string(), value);
            }
        }
        Ok(values)
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        for key in SESSION_KEYS {
            match values.get(key) {
                Some(value) => self.slots.set(key, value)?,
                None => self.slots.delete(key)?,
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "keyring"
    }
}
