//! Error types for six-contacts.

use thiserror::Error;

use crate::permission::PermissionState;

/// Result type for six-contacts operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the contact sync coordinator.
///
/// Every variant is `Clone` because a single coalesced operation hands the
/// same outcome to all of its waiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The user or the OS declined contact access.
    #[error("contact permission not granted: {0}")]
    PermissionDenied(PermissionState),

    /// Querying or requesting the OS permission failed outright.
    #[error("permission query failed: {0}")]
    Permission(String),

    /// Enumerating device contacts failed.
    #[error("failed to load device contacts: {0}")]
    Load(String),

    /// A sync was attempted with nothing to send.
    #[error("no contacts available to sync")]
    NoContacts,

    /// The remote sync call failed.
    #[error("contact sync failed: {0}")]
    Sync(String),

    /// The background task running a coalesced operation died.
    #[error("background task failed: {0}")]
    Task(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means contacts are unavailable because access was refused.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
