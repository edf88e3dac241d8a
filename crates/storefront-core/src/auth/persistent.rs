use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::session::{SessionStore, SESSION_KEYS};

/// Session file name in the session directory
const SESSION_FILE: &str = "session.json";

/// Durable storage behind a `PersistentSessionStore`.
pub trait SessionBackend: Send + Sync {
    /// Read every stored session value
    fn load(&self) -> Result<HashMap<String, String>>;

    /// Replace the stored session with `values`
    fn persist(&self, values: &HashMap<String, String>) -> Result<()>;

    /// Short name for log fields
    fn name(&self) -> &'static str;
}

/// Session values kept as a flat JSON object in `session.json`
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(session_dir: impl AsRef<Path>) -> Self {
        Self {
            path: session_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        let values = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;
        Ok(values)
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)
                    .context("Failed to remove session file")?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create session directory")?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;

        // The file holds a bearer token: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict session file permissions")?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Write-through session store.
///
/// Values are loaded once when the store is opened and mirrored in memory.
/// Every change is written to the backend while the mirror lock is held, so
/// the backend never sees writes out of order. Backend failures are logged
/// and otherwise ignored: the mirror stays authoritative for this process.
pub struct PersistentSessionStore<B: SessionBackend> {
    backend: B,
    values: Mutex<HashMap<String, String>>,
}

impl<B: SessionBackend> PersistentSessionStore<B> {
    /// Open the store, starting empty if the backend cannot be read
    pub fn open(backend: B) -> Self {
        let values = match backend.load() {
            Ok(mut values) => {
                values.retain(|key, _| SESSION_KEYS.contains(&key.as_str()));
                debug!(backend = backend.name(), keys = values.len(), "Loaded session");
                values
            }
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "Session storage unavailable, starting empty");
                HashMap::new()
            }
        };
        Self {
            backend,
            values: Mutex::new(values),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_through(&self, values: &HashMap<String, String>) {
        if let Err(e) = self.backend.persist(values) {
            warn!(backend = self.backend.name(), error = %e, "Failed to persist session, keeping it in memory");
        }
    }
}

impl<B: SessionBackend> SessionStore for PersistentSessionStore<B> {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) {
        let mut values = self.values();
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        self.write_through(&values);
    }

    fn clear(&self) {
        let mut values = self.values();
        for key in SESSION_KEYS {
            values.remove(key);
        }
        self.write_through(&values);
    }
}
