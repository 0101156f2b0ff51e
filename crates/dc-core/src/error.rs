//! Error types for fetches and storage backends.

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend failed to perform the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Failed to serialize or deserialize a stored value.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Errors delivered to a fetch's error callback.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// HTTP error response.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Failed to perform the request.
    #[error("Request failed: {0}")]
    Request(String),

    /// Failed to decode the response payload.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A storage read backing the fetch failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The fetch was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl ResponseError {
    /// Create a request error from any displayable value.
    pub fn request(message: impl std::fmt::Display) -> Self {
        Self::Request(message.to_string())
    }

    /// HTTP status code, if this is an HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the fetch was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
