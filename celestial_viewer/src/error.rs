//! Error types for the viewer.

use celestial_field::FieldError;
use celestial_gesture::TrackingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    /// The window could not be opened or updated.
    #[error("Window error: {0}")]
    Window(String),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
