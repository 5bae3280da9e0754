//! Keyed preference stores and the language preference helpers.
//!
//! # Design
//! - The store is synchronous and string-valued, the same contract as browser
//!   local storage, so it can be read before any async runtime work starts.
//! - `JsonFileStore` is the process-wide store for native builds: one flat JSON
//!   object per file, rewritten through a temporary file.
//! - Reading the language key never fails the caller; an unreadable store is
//!   treated as "no preference".

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::language::{LANGUAGE_STORAGE_KEY, LanguageCode};

/// Keyed string store shared across the process.
pub trait PreferenceStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Read the persisted language preference, if any.
///
/// Store failures are logged and reported as an absent preference.
#[must_use]
pub fn load_language_preference(store: &dyn PreferenceStore) -> Option<String> {
    match store.get(LANGUAGE_STORAGE_KEY) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, key = LANGUAGE_STORAGE_KEY, "language preference unreadable");
            None
        }
    }
}

/// Persist an explicit language choice made by the user.
///
/// # Errors
///
/// Returns an error when the store cannot be written.
pub fn persist_language(store: &dyn PreferenceStore, language: LanguageCode) -> StoreResult<()> {
    store.set(LANGUAGE_STORAGE_KEY, language.code())?;
    debug!(language = %language, "language preference persisted");
    Ok(())
}

/// Volatile store used by tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    operation: "preferences.read",
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, key: &str, values: &BTreeMap<String, String>) -> StoreResult<()> {
        let encoded = serde_json::to_string_pretty(values).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                operation: "preferences.create_dir",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|source| StoreError::Io {
            operation: "preferences.write",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| StoreError::Io {
            operation: "preferences.rename",
            path: self.path.clone(),
            source,
        })
    }

    fn update(
        &self,
        key: &str,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        apply(&mut values);
        self.save(key, &values)
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.update(key, |values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.update(key, |values| {
            values.remove(key);
        })
    }
}
