use crate::modules::locations::application::repository::LocationRepository;
use crate::modules::positioning::application::geolocation::GeolocationAdapter;
use crate::modules::positioning::application::tracker::PositionTracker;
use crate::modules::positioning::core::ports::Platform;
use crate::shared::infrastructure::key_value_store::file::FileKeyValueStore;
use crate::shell::config::Settings;
use std::sync::Arc;

/// The services of one running process, constructed once and handed to the presentation layer.
#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<LocationRepository<FileKeyValueStore>>,
    pub geolocation: Arc<GeolocationAdapter>,
    pub tracker: Arc<PositionTracker>,
}

impl AppState {
    pub fn new(settings: &Settings, platform: Platform) -> Self {
        let store = Arc::new(FileKeyValueStore::new(settings.data_dir.clone()));
        let geolocation = Arc::new(GeolocationAdapter::new(platform));
        Self {
            locations: Arc::new(LocationRepository::new(store)),
            tracker: Arc::new(PositionTracker::new(geolocation.clone())),
            geolocation,
        }
    }

    /// Releases the platform watch, if tracking.
    pub fn shutdown(&self) {
        self.tracker.stop_position_tracking();
        self.geolocation.clear_active_watch();
    }
}
