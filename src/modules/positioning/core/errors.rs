use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PERMISSION_DENIED: u16 = 1;
pub const POSITION_UNAVAILABLE: u16 = 2;
pub const TIMEOUT: u16 = 3;

/// Error as the platform delivers it: a numeric code and a free-form message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPositionError {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

impl RawPositionError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("geolocation is not supported")]
    Unsupported,

    #[error("access to the location was denied")]
    PermissionDenied,

    #[error("location is not available")]
    PositionUnavailable,

    #[error("timed out while requesting the location")]
    Timeout,

    #[error("unknown geolocation error (code {code})")]
    Unknown { code: u16 },
}

impl GeolocationError {
    pub fn from_code(code: u16) -> Self {
        match code {
            PERMISSION_DENIED => GeolocationError::PermissionDenied,
            POSITION_UNAVAILABLE => GeolocationError::PositionUnavailable,
            TIMEOUT => GeolocationError::Timeout,
            code => GeolocationError::Unknown { code },
        }
    }

    /// Whether asking again may succeed without the user changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeolocationError::PositionUnavailable | GeolocationError::Timeout
        )
    }
}

impl From<RawPositionError> for GeolocationError {
    fn from(raw: RawPositionError) -> Self {
        Self::from_code(raw.code)
    }
}
