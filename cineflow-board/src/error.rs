//! Error types for the board engine
//!
//! Pure board operations never fail; these errors only come from the
//! persistence boundary, configuration, and parsing of external names.

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur at the board's boundaries
#[derive(Debug, Error)]
pub enum BoardError {
    /// Backend could not be reached or initialized. Surfaced once at connect.
    #[error("sync backend unavailable: {message}")]
    Unavailable { message: String },

    /// Stored document exists but cannot be read as a board
    #[error("malformed document for board {board_id}: {message}")]
    MalformedDocument { board_id: String, message: String },

    /// Identity is not on the board's allow-list
    #[error("access denied for {identity}")]
    AccessDenied { identity: String },

    /// Document lock is held by another process
    #[error("lock busy - another write in progress")]
    LockBusy,

    /// Unknown pipeline stage name
    #[error("unknown stage: {value}")]
    UnknownStage { value: String },

    /// Unknown quick-flag name
    #[error("unknown flag: {value}")]
    UnknownFlag { value: String },

    /// Unknown view mode name
    #[error("unknown view mode: {value}")]
    UnknownViewMode { value: String },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// File watcher failure
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a malformed document error
    pub fn malformed(board_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            board_id: board_id.into(),
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockBusy)
    }
}

impl From<figment::Error> for BoardError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
