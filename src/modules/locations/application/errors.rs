use thiserror::Error;

/// Repository failures. Each one is also recorded in the repository's error slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("failed to load locations: {0}")]
    LoadFailed(String),

    #[error("failed to save location: {0}")]
    SaveFailed(String),

    #[error("failed to delete location {id}: {reason}")]
    DeleteFailed { id: String, reason: String },
}
