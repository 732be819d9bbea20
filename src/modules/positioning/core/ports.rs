// Ports for the platform's location capabilities.
//
// Boundaries
// - Sources speak the platform's raw shapes (`RawFix`, `RawPositionError`). Normalization and
//   error mapping happen in the geolocation adapter, never in a source.
// - A watch is a channel of raw events plus an id. The source keeps the sending half until
//   `clear_watch` is called with that id.

use crate::modules::positioning::core::errors::RawPositionError;
use crate::modules::positioning::core::options::PositionOptions;
use crate::modules::positioning::core::permission::PermissionState;
use crate::modules::positioning::core::position::RawFix;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub type RawWatchEvent = Result<RawFix, RawPositionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: PositionOptions) -> Result<RawFix, RawPositionError>;
    fn watch_position(&self, options: PositionOptions) -> (WatchId, UnboundedReceiver<RawWatchEvent>);
    fn clear_watch(&self, id: WatchId);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("permission query failed: {0}")]
pub struct PermissionQueryError(pub String);

#[async_trait]
pub trait PermissionQuery: Send + Sync {
    async fn geolocation_permission(&self) -> Result<PermissionState, PermissionQueryError>;
}

/// The capabilities the running platform exposes. Either may be missing.
#[derive(Clone, Default)]
pub struct Platform {
    pub geolocation: Option<Arc<dyn PositionSource>>,
    pub permissions: Option<Arc<dyn PermissionQuery>>,
}

impl Platform {
    pub fn new(
        geolocation: Option<Arc<dyn PositionSource>>,
        permissions: Option<Arc<dyn PermissionQuery>>,
    ) -> Self {
        Self {
            geolocation,
            permissions,
        }
    }

    /// A platform with no location capabilities at all.
    pub fn bare() -> Self {
        Self::default()
    }
}
