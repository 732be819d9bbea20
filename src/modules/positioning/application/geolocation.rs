// Geolocation adapter over the platform position source.
//
// Responsibilities
// - Turn the platform's one-shot request into a single normalized result.
// - Turn the platform's watch into a subscription, or into callbacks driven by a spawned task.
// - Map every raw platform error code to a `GeolocationError` in one place.
// - Remember which watch is active so it can be cleared without holding the handle.
//
// Boundaries
// - Options timeouts are enforced by the position source, not here.

use crate::modules::positioning::application::subscription::{PositionSubscription, WatchHandle};
use crate::modules::positioning::core::errors::GeolocationError;
use crate::modules::positioning::core::options::PositionOptions;
use crate::modules::positioning::core::permission::PermissionState;
use crate::modules::positioning::core::ports::Platform;
use crate::modules::positioning::core::position::Position;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub struct GeolocationAdapter {
    platform: Platform,
    active_watch: Mutex<Option<WatchHandle>>,
}

impl GeolocationAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            active_watch: Mutex::new(None),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.platform.geolocation.is_some()
    }

    /// One fix. `None` options means `PositionOptions::one_shot()`.
    pub async fn get_current_position(
        &self,
        options: Option<PositionOptions>,
    ) -> Result<Position, GeolocationError> {
        let source = self
            .platform
            .geolocation
            .as_ref()
            .ok_or(GeolocationError::Unsupported)?;
        let options = options.unwrap_or_else(PositionOptions::one_shot);
        match source.current_position(options).await {
            Ok(fix) => Ok(Position::from(fix)),
            Err(raw) => {
                let err = GeolocationError::from(raw.clone());
                debug!(code = raw.code, message = %raw.message, error = %err, "position request failed");
                Err(err)
            }
        }
    }

    /// Opens a watch as a subscription. `None` options means `PositionOptions::watch()`.
    ///
    /// The new watch becomes the adapter's active watch.
    pub fn subscribe(
        &self,
        options: Option<PositionOptions>,
    ) -> Result<PositionSubscription, GeolocationError> {
        let source = self
            .platform
            .geolocation
            .clone()
            .ok_or(GeolocationError::Unsupported)?;
        let options = options.unwrap_or_else(PositionOptions::watch);
        let (id, events) = source.watch_position(options);
        let handle = WatchHandle::new(id, source);
        *self.active() = Some(handle.clone());
        debug!(watch = %id, "watch opened");
        Ok(PositionSubscription::new(handle, events))
    }

    /// Opens a watch and forwards every event to the callbacks until the watch is cleared.
    ///
    /// When geolocation is unsupported, `on_error` is called before returning `None`.
    pub fn watch_position<U, E>(
        &self,
        on_update: U,
        on_error: E,
        options: Option<PositionOptions>,
    ) -> Option<WatchHandle>
    where
        U: Fn(Position) + Send + Sync + 'static,
        E: Fn(GeolocationError) + Send + Sync + 'static,
    {
        let mut subscription = match self.subscribe(options) {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(error = %err, "cannot watch position");
                on_error(err);
                return None;
            }
        };
        let handle = subscription.handle().clone();
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                match event {
                    Ok(position) => on_update(position),
                    Err(err) => on_error(err),
                }
            }
        });
        handle.attach_forwarder(task);
        Some(handle)
    }

    /// Cancels `handle`. Clearing an already cleared handle does nothing.
    pub fn clear_watch(&self, handle: &WatchHandle) {
        handle.cancel();
        let mut active = self.active();
        if active.as_ref() == Some(handle) {
            *active = None;
        }
    }

    /// Cancels whatever watch is currently active, if any.
    pub fn clear_active_watch(&self) {
        if let Some(handle) = self.active().take() {
            handle.cancel();
        }
    }

    pub fn active_watch(&self) -> Option<WatchHandle> {
        self.active().clone().filter(|handle| !handle.is_cleared())
    }

    pub async fn check_permissions(&self) -> PermissionState {
        let Some(permissions) = self.platform.permissions.as_ref() else {
            return PermissionState::Unsupported;
        };
        match permissions.geolocation_permission().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "permission query failed");
                PermissionState::Unknown
            }
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<WatchHandle>> {
        self.active_watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
