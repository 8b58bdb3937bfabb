//! Credential storage.
//!
//! A `Session` is passed explicitly into every `ApiClient`, so tests and
//! multi-account tools can hold several isolated sessions side by side.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ClientConfig;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key/value persistence for credentials
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

fn lock(values: &Mutex<HashMap<String, String>>) -> MutexGuard<'_, HashMap<String, String>> {
    values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Tokens kept for the lifetime of the process only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        lock(&self.values).remove(key);
    }
}

/// Tokens persisted as a flat JSON object on disk
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store, starting empty when the file is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "Ignoring malformed token file: {}", e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let result = serde_json::to_vec_pretty(values)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(&self.path, bytes));

        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "Failed to persist tokens: {}", e);
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

/// The credentials of one signed-in user
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// File-backed when `TOKEN_STORE_PATH` is configured, in-memory otherwise
    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.token_store_path {
            Some(path) => Self::new(Arc::new(FileTokenStore::open(path))),
            None => Self::in_memory(),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Store a new access token, and the refresh token when one was issued
    pub fn set_tokens(&self, access_token: &str, refresh_token: Option<&str>) {
        self.store.set(ACCESS_TOKEN_KEY, access_token);
        if let Some(refresh_token) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token);
        }
    }

    pub fn clear(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
