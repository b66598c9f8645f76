//! Storage port for plant histories and the simple in-process adapters.
//!
//! The history store only sees string keys and string values, the same shape
//! as browser local storage. Durable adapters live in [`crate::file_store`]
//! and [`crate::db`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{Backend, Config};
use crate::db::MongoStore;
use crate::error::StoreError;
use crate::file_store::JsonFileStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Returns whether the key was present.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Every key currently stored, in no particular order.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries().remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

/// Backend for when no storage is reachable: every read is empty and
/// every write is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStore;

#[async_trait]
impl KeyValueStore for DetachedStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        debug!(key, "detached store, write dropped");
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(vec![])
    }
}

/// Opens the backend selected in `config`.
pub async fn open(config: &Config) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        Backend::File => Arc::new(JsonFileStore::open(&config.store_path).await?),
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Detached => Arc::new(DetachedStore),
        Backend::Mongo => Arc::new(MongoStore::connect(&config.mongo_uri).await?),
    };
    info!(backend = ?config.backend, "storage backend ready");
    Ok(store)
}
