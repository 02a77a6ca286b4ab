//! Session-scoped key/value storage for the auth stores.
//!
//! Mirrors the browser's `sessionStorage` contract: string keys, string values,
//! no cross-process synchronization. Entries are written in a versioned
//! envelope `{"state": .., "version": 0}` so older clients can detect shape
//! changes.

use crate::client::AppError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};
use tracing::{debug, warn};

/// Key holding the bearer token.
pub const AUTHENTICATION_KEY: &str = "authentication-storage";
/// Key holding the last-resolved user record.
pub const USER_KEY: &str = "user-storage";
/// Key holding the last-resolved role.
pub const ROLE_KEY: &str = "role-state";

pub const STORAGE_VERSION: u32 = 0;

pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns `AppError::Storage` if the value cannot be persisted.
    fn set_item(&self, key: &str, value: String) -> Result<(), AppError>;

    /// # Errors
    /// Returns `AppError::Storage` if the value cannot be removed.
    fn remove_item(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// Reads a versioned entry. Corrupt or mismatched entries read as absent.
pub fn read_state<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == STORAGE_VERSION => Some(envelope.state),
        Ok(envelope) => {
            warn!(key, version = envelope.version, "ignoring stored state with unknown version");
            None
        }
        Err(err) => {
            warn!(key, "ignoring corrupt stored state: {err}");
            None
        }
    }
}

/// Writes a versioned entry.
///
/// # Errors
/// Returns `AppError::Serialization` or `AppError::Storage` on failure.
pub fn write_state<T: Serialize>(
    storage: &dyn SessionStorage,
    key: &str,
    state: &T,
) -> Result<(), AppError> {
    let envelope = Envelope {
        state,
        version: STORAGE_VERSION,
    };
    let raw = serde_json::to_string(&envelope)
        .map_err(|err| AppError::Serialization(format!("Failed to encode {key}: {err}")))?;
    storage.set_item(key, raw)
}

/// In-memory storage; lives as long as the process, like a browser tab's session.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

/// JSON file storage used by the CLI so a session survives between invocations.
/// The whole map is rewritten on every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or lazily creates) the storage file. A missing or unreadable file
    /// starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), "discarding unreadable session file: {err}");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Self {
            path,
            items: Mutex::new(items),
        }
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(items)
            .map_err(|err| AppError::Serialization(format!("Failed to encode session: {err}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    AppError::Storage(format!("Failed to create {}: {err}", parent.display()))
                })?;
            }
        }

        fs::write(&self.path, raw).map_err(|err| {
            AppError::Storage(format!("Failed to write {}: {err}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value);
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }
}
