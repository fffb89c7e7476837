//! Error types for vjdeck
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the vjdeck engine
#[derive(Error, Debug)]
pub enum DeckError {
    /// The user declined microphone access. Beat switching is disabled;
    /// timer-driven rotation is unaffected.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// No capture device is present on this machine. Same degradation
    /// as a denied permission; kept separate for diagnostics.
    #[error("No microphone found")]
    DeviceAbsent,

    /// Audio capture failed after access was granted
    #[error("Capture error: {0}")]
    Capture(String),

    /// The content provider has nothing matching the requested theme
    #[error("{}", no_content_message(.theme))]
    ContentNotFound { theme: Option<String> },

    /// Any other content provider failure
    #[error("Content provider error: {0}")]
    Provider(String),

    /// A slot id outside 1..=3 reached the scheduler. This is a
    /// programmer error, not a runtime condition: the slot count is
    /// fixed. The operation carrying it is aborted, never retried.
    #[error("Invalid slot id: {0}")]
    InvalidSlot(u8),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for vjdeck
pub type Result<T> = std::result::Result<T, DeckError>;

fn no_content_message(theme: &Option<String>) -> String {
    match theme {
        Some(t) => format!("No content available for theme \"{t}\""),
        None => "No content available".to_string(),
    }
}
