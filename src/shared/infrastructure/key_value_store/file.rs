// File system implementation of the KeyValueStore port.
//
// Each key maps to one `<key>.json` document inside the data directory. Writes go to a sibling
// temporary file first and are renamed over the target, so a reader never observes a half
// written collection.

use super::{KeyValueStore, KeyValueStoreError};
use serde_json::Value as Json;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KeyValueStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KeyValueStoreError::Backend(format!("invalid key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<Json>, KeyValueStoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KeyValueStoreError::Unavailable(e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| KeyValueStoreError::Serialization(e.to_string()))
    }

    async fn set_item(&self, key: &str, value: Json) -> Result<(), KeyValueStoreError> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(&value)
            .map_err(|e| KeyValueStoreError::Serialization(e.to_string()))?;
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| KeyValueStoreError::Unavailable(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| KeyValueStoreError::Backend(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| KeyValueStoreError::Backend(e.to_string()))?;
        debug!(key, path = %path.display(), bytes = bytes.len(), "stored item");
        Ok(())
    }
}

#[cfg(test)]
mod file_key_value_store_tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    #[fixture]
    fn data_dir() -> TempDir {
        tempfile::tempdir().expect("expected a temporary directory")
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_none_before_anything_was_written(data_dir: TempDir) {
        let store = FileKeyValueStore::new(data_dir.path().join("nested"));
        assert_eq!(store.get_item("locations").await.unwrap(), None);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_persist_a_value_across_instances(data_dir: TempDir) {
        let value = json!([{"id": "a", "floor": 2}]);
        FileKeyValueStore::new(data_dir.path())
            .set_item("locations", value.clone())
            .await
            .expect("expected to write");

        let reopened = FileKeyValueStore::new(data_dir.path());
        assert_eq!(reopened.get_item("locations").await.unwrap(), Some(value));
        assert!(!data_dir.path().join("locations.json.tmp").exists());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_keys_that_escape_the_data_directory(data_dir: TempDir) {
        let store = FileKeyValueStore::new(data_dir.path());
        let result = store.set_item("../outside", json!(1)).await;
        assert!(matches!(result, Err(KeyValueStoreError::Backend(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_corrupt_document(data_dir: TempDir) {
        std::fs::write(data_dir.path().join("locations.json"), b"{not json").unwrap();
        let store = FileKeyValueStore::new(data_dir.path());
        let result = store.get_item("locations").await;
        assert!(matches!(result, Err(KeyValueStoreError::Serialization(_))));
    }
}
