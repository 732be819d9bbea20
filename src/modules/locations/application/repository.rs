// Location repository: the in-memory collection plus its durable copy.
//
// Responsibilities
// - Load the persisted collection, expose it filtered by floor or id.
// - Create and delete records, persisting the complete collection after every mutation.
// - Record the last failure in an error slot for display, and log it.
//
// Ordering
// - Loads and mutations run through one writer lock, so persisted writes land in call order and
//   a slow write can never be overtaken by a later one.
// - A mutation whose write fails is rolled back in memory. Memory and store agree after every
//   call, successful or not.
// - `loading` counts pending loads, so it stays up while any load is queued or reading and drops
//   even when a load future is cancelled.

use crate::modules::locations::adapters::outbound::location_collection::{
    load_collection, persist_collection,
};
use crate::modules::locations::application::errors::LocationError;
use crate::modules::locations::core::location::{Floor, Location, LocationDraft};
use crate::modules::locations::core::state::LocationsState;
use crate::shared::infrastructure::key_value_store::KeyValueStore;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

pub struct LocationRepository<TStore>
where
    TStore: KeyValueStore + 'static,
{
    store: Arc<TStore>,
    state: RwLock<LocationsState>,
    writer: Mutex<()>,
    pending_loads: AtomicUsize,
}

/// Marks one load as pending until dropped.
struct PendingLoad<'a>(&'a AtomicUsize);

impl<'a> PendingLoad<'a> {
    fn enter(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(pending)
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<TStore> LocationRepository<TStore>
where
    TStore: KeyValueStore + 'static,
{
    pub fn new(store: Arc<TStore>) -> Self {
        Self {
            store,
            state: RwLock::new(LocationsState::default()),
            writer: Mutex::new(()),
            pending_loads: AtomicUsize::new(0),
        }
    }

    pub async fn load_locations(&self) -> Result<(), LocationError> {
        let _pending = PendingLoad::enter(&self.pending_loads);
        let _writer = self.writer.lock().await;

        let result = load_collection(&*self.store).await;

        let mut state = self.state.write().await;
        match result {
            Ok(locations) => {
                info!(count = locations.len(), "loaded locations");
                state.locations = locations;
                Ok(())
            }
            Err(e) => {
                let err = LocationError::LoadFailed(e.to_string());
                error!(error = %e, "failed to load locations");
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn save_location(&self, draft: LocationDraft) -> Result<Location, LocationError> {
        let _writer = self.writer.lock().await;

        let location = Location::create(draft, Utc::now());
        let snapshot = {
            let mut state = self.state.write().await;
            state.locations.push(location.clone());
            state.locations.clone()
        };

        match persist_collection(&*self.store, &snapshot).await {
            Ok(()) => {
                info!(id = location.id(), floor = %location.floor(), "saved location");
                Ok(location)
            }
            Err(e) => {
                let err = LocationError::SaveFailed(e.to_string());
                error!(id = location.id(), error = %e, "failed to save location");
                let mut state = self.state.write().await;
                state.locations.retain(|l| l.id() != location.id());
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Removes the record with `id` and returns it. Deleting an unknown id still rewrites the
    /// collection unchanged.
    pub async fn delete_location(&self, id: &str) -> Result<Option<Location>, LocationError> {
        let _writer = self.writer.lock().await;

        let (removed, snapshot) = {
            let mut state = self.state.write().await;
            let removed = state
                .locations
                .iter()
                .position(|l| l.id() == id)
                .map(|index| (index, state.locations.remove(index)));
            (removed, state.locations.clone())
        };
        if removed.is_none() {
            debug!(id, "no location to delete");
        }

        match persist_collection(&*self.store, &snapshot).await {
            Ok(()) => {
                info!(id, deleted = removed.is_some(), "deleted location");
                Ok(removed.map(|(_, location)| location))
            }
            Err(e) => {
                let err = LocationError::DeleteFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                };
                error!(id, error = %e, "failed to delete location");
                let mut state = self.state.write().await;
                if let Some((index, location)) = removed {
                    state.locations.insert(index, location);
                }
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn locations_by_floor(&self, floor: &Floor) -> Vec<Location> {
        self.state.read().await.by_floor(floor)
    }

    pub async fn location_by_id(&self, id: &str) -> Option<Location> {
        self.state.read().await.by_id(id)
    }

    pub async fn locations(&self) -> Vec<Location> {
        self.state.read().await.locations.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.pending_loads.load(Ordering::SeqCst) > 0
    }

    pub async fn error(&self) -> Option<LocationError> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn snapshot(&self) -> LocationsState {
        let mut snapshot = self.state.read().await.clone();
        snapshot.loading = self.is_loading().await;
        snapshot
    }
}

#[cfg(test)]
mod location_repository_tests {
    use super::*;
    use crate::modules::locations::adapters::outbound::location_collection::LOCATIONS_KEY;
    use crate::shared::infrastructure::key_value_store::in_memory::InMemoryKeyValueStore;
    use crate::test_support::fixtures::locations::{room_draft, stored_collection};
    use chrono::DateTime;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    type BeforeEachReturn = (
        Arc<InMemoryKeyValueStore>,
        LocationRepository<InMemoryKeyValueStore>,
    );

    #[fixture]
    fn before_each() -> BeforeEachReturn {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let repository = LocationRepository::new(store.clone());
        (store, repository)
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_load_an_empty_store_as_an_empty_collection(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        repository.load_locations().await.expect("load failed");
        assert!(repository.locations().await.is_empty());
        assert_eq!(repository.error().await, None);
        assert!(!repository.is_loading().await);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_load_a_persisted_collection() {
        let stored = stored_collection();
        let store = Arc::new(InMemoryKeyValueStore::with_item(
            LOCATIONS_KEY,
            serde_json::to_value(&stored).unwrap(),
        ));
        let repository = LocationRepository::new(store);
        repository.load_locations().await.unwrap();
        assert_eq!(repository.locations().await, stored);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_record_a_failed_load_and_keep_the_previous_collection(
        before_each: BeforeEachReturn,
    ) {
        let (store, repository) = before_each;
        let saved = repository.save_location(room_draft(1, "Lobby")).await.unwrap();
        store.set_offline(true);

        let result = repository.load_locations().await;

        assert!(matches!(result, Err(LocationError::LoadFailed(_))));
        assert!(matches!(repository.error().await, Some(LocationError::LoadFailed(_))));
        assert_eq!(repository.locations().await, vec![saved]);
        assert!(!repository.is_loading().await);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_to_load_a_malformed_collection() {
        let store = Arc::new(InMemoryKeyValueStore::with_item(LOCATIONS_KEY, json!("garbage")));
        let repository = LocationRepository::new(store);
        let result = repository.load_locations().await;
        assert!(matches!(result, Err(LocationError::LoadFailed(_))));
        assert!(repository.locations().await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_be_loading_only_while_the_read_is_in_flight(before_each: BeforeEachReturn) {
        let (store, repository) = before_each;
        store.set_delay_ms(50);
        let repository = Arc::new(repository);
        assert!(!repository.is_loading().await);

        let task = tokio::spawn({
            let repository = repository.clone();
            async move { repository.load_locations().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(repository.is_loading().await);

        task.await.unwrap().unwrap();
        assert!(!repository.is_loading().await);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_stay_loading_until_overlapping_loads_have_finished(
        before_each: BeforeEachReturn,
    ) {
        let (store, repository) = before_each;
        store.set_delay_ms(50);
        let repository = Arc::new(repository);

        let first = tokio::spawn({
            let repository = repository.clone();
            async move { repository.load_locations().await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = tokio::spawn({
            let repository = repository.clone();
            async move { repository.load_locations().await }
        });

        first.await.unwrap().unwrap();
        assert!(!second.is_finished());
        assert!(repository.is_loading().await);
        assert!(repository.snapshot().await.loading);

        second.await.unwrap().unwrap();
        assert!(!repository.is_loading().await);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_stop_loading_when_a_load_is_abandoned(before_each: BeforeEachReturn) {
        let (store, repository) = before_each;
        store.set_delay_ms(100);

        let outcome =
            tokio::time::timeout(Duration::from_millis(10), repository.load_locations()).await;

        assert!(outcome.is_err());
        assert!(!repository.is_loading().await);
        assert!(!repository.snapshot().await.loading);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_save_a_location_with_id_and_created_at(before_each: BeforeEachReturn) {
        let (store, repository) = before_each;
        let location = repository
            .save_location(room_draft(2, "Room A"))
            .await
            .expect("save failed");

        assert_eq!(location.floor(), &Floor::Level(2));
        assert_eq!(location.field("name"), Some(&json!("Room A")));
        assert!(!location.id().is_empty());
        let raw = serde_json::to_value(&location).unwrap();
        let created_at = raw["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created_at).is_ok());

        assert_eq!(
            repository.locations_by_floor(&Floor::Level(2)).await,
            vec![location.clone()]
        );
        assert_eq!(store.write_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_give_every_saved_location_a_unique_id(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let mut ids = HashSet::new();
        for i in 0..50 {
            let location = repository.save_location(room_draft(i % 3, "Room")).await.unwrap();
            ids.insert(location.id().to_string());
        }
        assert_eq!(ids.len(), 50);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_roll_back_a_save_that_could_not_be_persisted(
        before_each: BeforeEachReturn,
    ) {
        let (store, repository) = before_each;
        let kept = repository.save_location(room_draft(1, "Kept")).await.unwrap();
        store.set_offline(true);

        let result = repository.save_location(room_draft(1, "Lost")).await;

        assert!(matches!(result, Err(LocationError::SaveFailed(_))));
        assert!(matches!(repository.error().await, Some(LocationError::SaveFailed(_))));
        assert_eq!(repository.locations().await, vec![kept]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_delete_a_location(before_each: BeforeEachReturn) {
        let (store, repository) = before_each;
        let a = repository.save_location(room_draft(1, "A")).await.unwrap();
        let b = repository.save_location(room_draft(1, "B")).await.unwrap();

        let removed = repository.delete_location(a.id()).await.unwrap();

        assert_eq!(removed, Some(a.clone()));
        assert_eq!(repository.location_by_id(a.id()).await, None);
        assert_eq!(repository.locations().await, vec![b]);
        assert_eq!(store.write_count(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_leave_the_collection_unchanged_when_deleting_an_unknown_id(
        before_each: BeforeEachReturn,
    ) {
        let (_, repository) = before_each;
        let a = repository.save_location(room_draft(1, "A")).await.unwrap();
        let removed = repository.delete_location("missing").await.unwrap();
        assert_eq!(removed, None);
        assert_eq!(repository.locations().await, vec![a]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_restore_a_location_whose_delete_could_not_be_persisted(
        before_each: BeforeEachReturn,
    ) {
        let (store, repository) = before_each;
        let a = repository.save_location(room_draft(1, "A")).await.unwrap();
        let b = repository.save_location(room_draft(1, "B")).await.unwrap();
        let c = repository.save_location(room_draft(1, "C")).await.unwrap();
        store.set_offline(true);

        let result = repository.delete_location(b.id()).await;

        match result {
            Err(LocationError::DeleteFailed { id, .. }) => assert_eq!(id, b.id()),
            other => panic!("expected DeleteFailed, got {other:?}"),
        }
        assert_eq!(repository.locations().await, vec![a, b, c]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_persist_overlapping_saves_in_order(before_each: BeforeEachReturn) {
        let (store, repository) = before_each;
        store.set_delay_ms(10);
        let (first, second) = tokio::join!(
            repository.save_location(room_draft(1, "First")),
            repository.save_location(room_draft(1, "Second"))
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        let reloaded = LocationRepository::new(store.clone());
        store.set_delay_ms(0);
        reloaded.load_locations().await.unwrap();
        let ids: Vec<_> = reloaded
            .locations()
            .await
            .iter()
            .map(|l| l.id().to_string())
            .collect();
        assert_eq!(ids, vec![first.id().to_string(), second.id().to_string()]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_clear_the_error_slot(before_each: BeforeEachReturn) {
        let (store, repository) = before_each;
        store.set_offline(true);
        let _ = repository.load_locations().await;
        assert!(repository.error().await.is_some());
        repository.clear_error().await;
        assert_eq!(repository.snapshot().await.error, None);
    }
}
