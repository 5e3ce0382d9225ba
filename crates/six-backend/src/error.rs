//! Error types for six-backend.

use thiserror::Error;

/// Result type for six-backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the remote contact matching and connection endpoints.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Nobody is signed in.
    #[error("user session error or no user signed in")]
    NoSession,

    /// The backend matched none of the submitted identifiers.
    #[error("no matching users found")]
    NoMatches,

    /// Every connection attempt failed, or no match was connectable.
    #[error("no connections were created ({attempted} attempted)")]
    NoConnections { attempted: usize },

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
