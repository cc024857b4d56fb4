//! Error types for boxcrate

use thiserror::Error;

/// The camera variants a type-specific mutation can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Orthographic,
    Perspective,
}

impl std::fmt::Display for CameraKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraKind::Orthographic => write!(f, "orthographic"),
            CameraKind::Perspective => write!(f, "perspective"),
        }
    }
}

/// Main error type for boxcrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Camera type mismatch: expected {expected} camera, found {found}")]
    CameraTypeMismatch { expected: CameraKind, found: CameraKind },

    #[error("Duplicate box id: {0}")]
    DuplicateId(u64),

    #[error("Background task error: {0}")]
    BackgroundTask(String),
}

/// Result type alias for boxcrate operations
pub type Result<T> = std::result::Result<T, Error>;
