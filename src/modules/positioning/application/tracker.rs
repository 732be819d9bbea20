// Position tracker: the process-wide "where am I" state.
//
// Responsibilities
// - Own the current position and the single active watch handle.
// - Start tracking with one immediate fix followed by a continuous watch.
// - Keep the last good fix when the watch reports errors; errors go to the log and to
//   `last_watch_error`, never to the caller.
//
// Invariants
// - If the initial fix fails, nothing is stored and no watch is opened.
// - At most one watch is outstanding. Starting again clears the previous watch.

use crate::modules::positioning::application::geolocation::GeolocationAdapter;
use crate::modules::positioning::application::subscription::WatchHandle;
use crate::modules::positioning::core::errors::GeolocationError;
use crate::modules::positioning::core::position::Position;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{error, info, warn};

pub struct PositionTracker {
    geolocation: Arc<GeolocationAdapter>,
    current: Arc<watch::Sender<Option<Position>>>,
    active_watch: Mutex<Option<WatchHandle>>,
    last_watch_error: Arc<Mutex<Option<GeolocationError>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PositionTracker {
    pub fn new(geolocation: Arc<GeolocationAdapter>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            geolocation,
            current: Arc::new(current),
            active_watch: Mutex::new(None),
            last_watch_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Stores one fresh fix, then opens the continuous watch. Returns the initial fix.
    pub async fn start_position_tracking(&self) -> Result<Position, GeolocationError> {
        let position = self
            .geolocation
            .get_current_position(None)
            .await
            .inspect_err(|e| error!(error = %e, "failed to start position tracking"))?;
        self.current.send_replace(Some(position));

        let current = self.current.clone();
        let last_watch_error = self.last_watch_error.clone();
        let handle = self
            .geolocation
            .watch_position(
                move |position| {
                    current.send_replace(Some(position));
                },
                move |e: GeolocationError| {
                    if e.is_retryable() {
                        warn!(error = %e, "position tracking error");
                    } else {
                        error!(error = %e, "position tracking error, no further fixes expected");
                    }
                    *lock(&last_watch_error) = Some(e);
                },
                None,
            )
            .ok_or(GeolocationError::Unsupported)?;

        let previous = lock(&self.active_watch).replace(handle.clone());
        if let Some(previous) = previous {
            self.geolocation.clear_watch(&previous);
        }
        info!(
            watch = %handle.id(),
            latitude = position.latitude,
            longitude = position.longitude,
            accuracy = position.accuracy,
            "position tracking started"
        );
        Ok(position)
    }

    /// Clears the active watch. The last known position stays available.
    pub fn stop_position_tracking(&self) -> bool {
        match lock(&self.active_watch).take() {
            Some(handle) => {
                self.geolocation.clear_watch(&handle);
                info!(watch = %handle.id(), "position tracking stopped");
                true
            }
            None => false,
        }
    }

    pub fn has_current_position(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn current_position(&self) -> Option<Position> {
        *self.current.borrow()
    }

    pub fn is_tracking(&self) -> bool {
        lock(&self.active_watch).is_some()
    }

    /// Receiver that observes every change of the current position.
    pub fn subscribe(&self) -> watch::Receiver<Option<Position>> {
        self.current.subscribe()
    }

    pub fn last_watch_error(&self) -> Option<GeolocationError> {
        *lock(&self.last_watch_error)
    }
}
