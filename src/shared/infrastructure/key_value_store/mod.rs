// Key-value store port used for all local persistence.
//
// Purpose
// - Describe the asynchronous storage capability the core needs: read one value by key, replace
//   one value by key.
//
// Boundaries
// - Values are whole JSON documents. There is no partial write; `set_item` replaces the value.
// - Adapters live next to this file (in memory, file system).

use async_trait::async_trait;
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyValueStoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing was ever stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<Json>, KeyValueStoreError>;
    async fn set_item(&self, key: &str, value: Json) -> Result<(), KeyValueStoreError>;
}

pub mod file;
pub mod in_memory;
