// src/error.rs
// =============================================================================
// Error types shared by every part of the combiner.
//
// The binary (main.rs) still uses anyhow at the top level, but everything
// below it returns this typed error so callers can tell a bad repository link
// apart from a failed download or a broken image.
//
// None of these errors are fatal to the process: a caller can always reset
// its session and try again.
// =============================================================================

use thiserror::Error;

/// Everything that can go wrong while listing, selecting or combining.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a GitHub link or has fewer than two path segments.
    /// Raised before any network call.
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidRepositoryReference(String),

    /// The host answered with a non-success status.
    /// `message` carries the host's own error text when it sent one.
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// A payload could not be decoded as a raster image during resize.
    #[error("Could not decode image: {0}")]
    ImageDecode(String),

    /// Connection, timeout or body read failure below the HTTP status level.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The host answered 2xx but the body was not what we expected.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Path not found in tree: {0}")]
    UnknownPath(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// The session moved to another repository while this work was running.
    #[error("Repository changed while the operation was running; result discarded")]
    StaleSession,
}

impl Error {
    /// HTTP status for remote failures, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
