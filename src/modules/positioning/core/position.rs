use serde::{Deserialize, Serialize};

/// Coordinates as the platform reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoords {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// One fix as the platform delivers it: `{coords: {..}, timestamp}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub coords: RawCoords,
    /// Capture time in epoch milliseconds.
    pub timestamp: i64,
}

/// Normalized position shared by one-shot reads and watches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in meters.
    pub accuracy: f64,
    pub timestamp: i64,
}

impl From<RawFix> for Position {
    fn from(fix: RawFix) -> Self {
        Self {
            latitude: fix.coords.latitude,
            longitude: fix.coords.longitude,
            accuracy: fix.coords.accuracy,
            timestamp: fix.timestamp,
        }
    }
}
