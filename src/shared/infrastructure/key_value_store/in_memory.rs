// In memory implementation of the KeyValueStore port.
//
// Purpose
// - Support repository tests and local development without touching the disk.
//
// Responsibilities
// - Keep one JSON value per key.
// - Simulate an unreachable backend (offline) and slow I/O (delay) for failure-path tests.

use super::{KeyValueStore, KeyValueStoreError};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<HashMap<String, Json>>,
    offline: AtomicBool,
    delay_ms: AtomicU64,
    writes: AtomicUsize,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: impl Into<String>, value: Json) -> Self {
        Self {
            inner: RwLock::new(HashMap::from([(key.into(), value)])),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_delay_ms(&self, ms: u64) {
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn simulate_io(&self) -> Result<(), KeyValueStoreError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::Unavailable("Key-value store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<Json>, KeyValueStoreError> {
        self.simulate_io().await?;
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: Json) -> Result<(), KeyValueStoreError> {
        self.simulate_io().await?;
        self.inner.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
