//! Core error types for advent-core.
//!
//! Every failure in the crate is typed. The calendar never treats any of
//! these as fatal -- callers recover locally (defaults, empty sets, guidance
//! messages) -- but the typed channel lets tests assert on failure paths
//! instead of having errors swallowed silently.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for advent-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Opened-state storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Audio resolution errors
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Layout computation errors
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
///
/// These are recovered by substituting built-in defaults; see
/// [`crate::config::CalendarConfig::load_or_default`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document could not be read from disk
    #[error("Failed to read configuration from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was not valid JSON for the expected shape
    #[error("Failed to parse configuration: {message}")]
    ParseFailed { message: String },
}

/// Opened-state store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A day outside the configured calendar range was rejected
    #[error("Day {day} is outside the calendar range {start}..={end}")]
    DayOutOfRange { day: u32, start: u32, end: u32 },

    /// Persisting a value failed (e.g. disk full / quota exceeded)
    #[error("Failed to write key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Backend-level failure (unreadable directory, etc.)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Audio probe errors.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Transport-level failure for both the HEAD probe and the GET fallback
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The probe did not answer within the configured timeout
    #[error("Probe for {url} timed out")]
    Timeout { url: String },
}

/// Layout computation errors.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The randomizer could not place a door without overlap
    #[error("Could not place door {day} within {attempts} attempts")]
    PlacementFailed { day: u32, attempts: u32 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
