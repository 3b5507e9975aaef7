//! Key/value storage adapters.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::infrastructure::ports::StoragePort;

/// File-backed storage
///
/// Stores key-value pairs in a single JSON file, by default at:
/// - Linux: ~/.config/vault/storage.json
/// - macOS: ~/Library/Application Support/io.wrldbldr.vault/storage.json
/// - Windows: C:\Users\<User>\AppData\Roaming\wrldbldr\vault\config\storage.json
///
/// The whole file is rewritten on every change.
#[derive(Clone)]
pub struct FileStorage {
    storage_path: PathBuf,
    /// In-memory copy of the stored values
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl FileStorage {
    /// Platform config location, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = ProjectDirs::from("io", "wrldbldr", "vault") {
            dirs.config_dir().join("storage.json")
        } else {
            PathBuf::from("vault_storage.json")
        }
    }

    /// Opens the storage file, loading existing values if present.
    ///
    /// An unreadable or corrupt file starts empty; the next write replaces it.
    pub fn open(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();

        let cache = if storage_path.exists() {
            match fs::read_to_string(&storage_path) {
                Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
                    Ok(map) => map,
                    Err(e) => {
                        tracing::warn!(path = ?storage_path, "Failed to parse storage file: {}", e);
                        HashMap::new()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = ?storage_path, "Failed to read storage file: {}", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::debug!(keys = cache.len(), "Storage initialized at: {:?}", storage_path);

        Self {
            storage_path,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn persist(&self) {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::error!("Failed to create storage directory: {}", e);
                    return;
                }
            }
        }

        let cache = match self.cache.read() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("Failed to acquire read lock for storage: {}", e);
                return;
            }
        };

        match serde_json::to_string_pretty(&*cache) {
            Ok(data) => {
                if let Err(e) = fs::write(&self.storage_path, data) {
                    tracing::error!("Failed to write storage file: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize storage data: {}", e);
            }
        }
    }
}

impl StoragePort for FileStorage {
    fn save(&self, key: &str, value: &str) {
        match self.cache.write() {
            Ok(mut guard) => {
                guard.insert(key.to_string(), value.to_string());
                drop(guard); // Release lock before I/O
                self.persist();
            }
            Err(e) => {
                tracing::error!("Failed to acquire write lock for storage: {}", e);
            }
        }
    }

    fn load(&self, key: &str) -> Option<String> {
        match self.cache.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(e) => {
                tracing::error!("Failed to acquire read lock for storage: {}", e);
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        match self.cache.write() {
            Ok(mut guard) => {
                if guard.remove(key).is_none() {
                    return;
                }
                drop(guard);
                self.persist();
            }
            Err(e) => {
                tracing::error!("Failed to acquire write lock for storage: {}", e);
            }
        }
    }
}

/// Storage that lives only as long as the process.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for InMemoryStorage {
    fn save(&self, key: &str, value: &str) {
        match self.values.write() {
            Ok(mut guard) => {
                guard.insert(key.to_string(), value.to_string());
            }
            Err(e) => tracing::error!("Failed to acquire write lock for storage: {}", e),
        }
    }

    fn load(&self, key: &str) -> Option<String> {
        self.values.read().ok().and_then(|guard| guard.get(key).cloned())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut guard) = self.values.write() {
            guard.remove(key);
        }
    }
}
