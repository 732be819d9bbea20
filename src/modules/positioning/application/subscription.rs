use crate::modules::positioning::core::errors::GeolocationError;
use crate::modules::positioning::core::ports::{PositionSource, RawWatchEvent, WatchId};
use crate::modules::positioning::core::position::Position;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::debug;

struct WatchState {
    id: WatchId,
    source: Arc<dyn PositionSource>,
    cleared: AtomicBool,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

/// Cancellation handle for one platform watch. Clones share the same watch.
#[derive(Clone)]
pub struct WatchHandle {
    inner: Arc<WatchState>,
}

impl WatchHandle {
    pub(crate) fn new(id: WatchId, source: Arc<dyn PositionSource>) -> Self {
        Self {
            inner: Arc::new(WatchState {
                id,
                source,
                cleared: AtomicBool::new(false),
                forwarder: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> WatchId {
        self.inner.id
    }

    pub fn is_cleared(&self) -> bool {
        self.inner.cleared.load(Ordering::SeqCst)
    }

    /// Cancels the platform watch. Returns false if it was already cancelled.
    pub(crate) fn cancel(&self) -> bool {
        if self.inner.cleared.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.source.clear_watch(self.inner.id);
        let forwarder = self
            .inner
            .forwarder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = forwarder {
            task.abort();
        }
        debug!(watch = %self.inner.id, "watch cleared");
        true
    }

    pub(crate) fn attach_forwarder(&self, task: JoinHandle<()>) {
        if self.is_cleared() {
            task.abort();
            return;
        }
        *self
            .inner
            .forwarder
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);
    }
}

impl PartialEq for WatchHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.inner.id)
            .field("cleared", &self.is_cleared())
            .finish()
    }
}

/// A continuous stream of normalized positions.
///
/// An error item does not end the stream; it ends only once the watch is cleared. Dropping the
/// subscription clears the watch.
pub struct PositionSubscription {
    handle: WatchHandle,
    events: UnboundedReceiver<RawWatchEvent>,
}

impl PositionSubscription {
    pub(crate) fn new(handle: WatchHandle, events: UnboundedReceiver<RawWatchEvent>) -> Self {
        Self { handle, events }
    }

    pub fn handle(&self) -> &WatchHandle {
        &self.handle
    }

    pub async fn next(&mut self) -> Option<Result<Position, GeolocationError>> {
        if self.handle.is_cleared() {
            return None;
        }
        let event = self.events.recv().await?;
        Some(event.map(Position::from).map_err(GeolocationError::from))
    }
}

impl Drop for PositionSubscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
