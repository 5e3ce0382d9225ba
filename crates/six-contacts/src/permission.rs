//! Contact-access permission gate.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::provider::ContactProvider;
use crate::status::StatusBoard;

/// Grant state reported by the OS contact provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

impl PermissionStatus {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Permission state as observed by UI consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Unknown,
    /// Nothing has been observed since the coordinator was created.
    #[default]
    Checking,
    Granted,
    Denied,
    Undetermined,
    /// The last check-and-load cycle failed.
    Error,
}

impl PermissionState {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => Self::Granted,
            PermissionStatus::Denied => Self::Denied,
            PermissionStatus::Undetermined => Self::Undetermined,
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Checking => "checking",
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Queries and requests OS contact permission, publishing every observed
/// state to the status board.
///
/// Denial is a normal outcome here, not an error. Only a provider failure
/// produces `Err`.
#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn ContactProvider>,
    board: StatusBoard,
}

impl PermissionGate {
    pub(crate) fn new(provider: Arc<dyn ContactProvider>, board: StatusBoard) -> Self {
        Self { provider, board }
    }

    /// Read the current grant state without prompting the user.
    pub async fn check(&self) -> Result<PermissionStatus> {
        let status = self.provider.permission_status().await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "Contact permission check failed");
            Error::Permission(format!("{e:#}"))
        })?;

        debug!(?status, "Observed contact permission");
        self.board.set_permission(status.into());
        Ok(status)
    }

    /// Prompt the user for contact access. Suspends until the user answers.
    pub async fn request(&self) -> Result<PermissionStatus> {
        let status = self.provider.request_permission().await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "Contact permission request failed");
            Error::Permission(format!("{e:#}"))
        })?;

        debug!(?status, "Contact permission request answered");
        self.board.set_permission(status.into());
        Ok(status)
    }

    /// Mark the observable state as failed.
    pub(crate) fn mark_error(&self) {
        self.board.set_permission(PermissionState::Error);
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("state", &self.board.snapshot().permission)
            .finish_non_exhaustive()
    }
}
