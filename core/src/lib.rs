// Duckytie Core Library
// Shared types for turning text into speech and playing it back

pub mod language;
pub mod platform;
pub mod request;

// Export core types
pub use language::{is_supported_language, supported_languages, Language};
pub use platform::{AudioFormat, PlatformProfile};
pub use request::{AudioResource, PlaybackResult, SpeechRequest};

use std::path::PathBuf;
use std::time::Duration;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuckytieError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Platform mismatch: {0}")]
    PlatformMismatch(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Missing file: {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("Playback did not finish within {0:?}")]
    PlaybackTimeout(Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DuckytieError {
    /// True for errors raised before any synthesis or file I/O happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DuckytieError::Validation(_) | DuckytieError::PlatformMismatch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DuckytieError>;
