use thiserror::Error;

/// Ways a hand-tracking provider can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// Device, library or model could not be loaded.
    #[error("hand tracking unavailable: {0}")]
    Unavailable(String),

    /// The user or platform refused camera / device access.
    #[error("hand tracking permission denied: {0}")]
    PermissionDenied(String),

    #[error("a tracking session is already running")]
    AlreadyRunning,

    /// The provider thread went away.
    #[error("tracking provider disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, TrackingError>;
