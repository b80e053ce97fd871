//! Error types for Lofi Core

use crate::notify::ErrorCategory;
use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Empty URL")]
    EmptyUrl,

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    // Player errors
    #[error("Player not ready")]
    PlayerUnavailable,

    #[error("Playback error {code}: {category}")]
    Playback { code: i32, category: ErrorCategory },

    #[error("Failed to load player API: {0}")]
    ApiLoad(String),

    #[error("Failed to create player: {0}")]
    PlayerCreate(String),

    #[error("Invalid player state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Player has been destroyed")]
    Destroyed,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a playback error from an external player error code
    pub fn playback(code: i32) -> Self {
        Error::Playback {
            code,
            category: ErrorCategory::from_code(code),
        }
    }

    /// Returns true if the adapter stays usable after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Destroyed | Error::InvalidConfig(_))
    }

    /// Returns a stable error code for logs and JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EmptyUrl => "EMPTY_URL",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::PlayerUnavailable => "PLAYER_UNAVAILABLE",
            Error::Playback { .. } => "PLAYBACK",
            Error::ApiLoad(_) => "API_LOAD",
            Error::PlayerCreate(_) => "PLAYER_CREATE",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::Destroyed => "DESTROYED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
