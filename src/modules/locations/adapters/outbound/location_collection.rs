use crate::modules::locations::core::location::Location;
use crate::shared::infrastructure::key_value_store::{KeyValueStore, KeyValueStoreError};

/// Fixed key the whole collection is stored under.
pub const LOCATIONS_KEY: &str = "locations";

/// Read the persisted collection. Nothing stored yet means an empty collection.
pub async fn load_collection(
    store: &impl KeyValueStore,
) -> Result<Vec<Location>, KeyValueStoreError> {
    match store.get_item(LOCATIONS_KEY).await? {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| KeyValueStoreError::Serialization(e.to_string())),
    }
}

/// Replace the persisted collection with `locations`.
pub async fn persist_collection(
    store: &impl KeyValueStore,
    locations: &[Location],
) -> Result<(), KeyValueStoreError> {
    let value = serde_json::to_value(locations)
        .map_err(|e| KeyValueStoreError::Serialization(e.to_string()))?;
    store.set_item(LOCATIONS_KEY, value).await
}
