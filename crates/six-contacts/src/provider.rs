//! External collaborators: the OS contact provider and the remote sync endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::contact::{ContactField, RawContact};
use crate::normalize::NormalizedPhoneSet;
use crate::permission::PermissionStatus;

/// Device contact capability of the host OS.
///
/// Failures are returned as errors and never retried by the coordinator.
#[async_trait]
pub trait ContactProvider: Send + Sync {
    /// Current grant state, without prompting.
    async fn permission_status(&self) -> anyhow::Result<PermissionStatus>;

    /// Prompt the user and wait for the answer.
    async fn request_permission(&self) -> anyhow::Result<PermissionStatus>;

    /// Read the address book, including at least `fields`.
    async fn enumerate_contacts(&self, fields: &[ContactField]) -> anyhow::Result<Vec<RawContact>>;
}

/// Remote endpoint that matches phone identifiers against registered users.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    async fn sync_contacts(&self, phones: &NormalizedPhoneSet) -> anyhow::Result<SyncReport>;
}

/// What a remote sync did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Identifiers sent to the backend.
    pub submitted: usize,
    /// Registered users matching those identifiers.
    pub matched: usize,
    /// Connections created.
    pub connected: usize,
    /// Connection attempts that failed.
    pub failed: usize,
}

/// A fixed, in-memory address book.
///
/// Backs contact exports loaded from disk and hosts without a real
/// contact store. Requests for permission return the configured status.
#[derive(Debug, Clone)]
pub struct MemoryContactProvider {
    contacts: Vec<RawContact>,
    status: PermissionStatus,
}

impl MemoryContactProvider {
    pub fn new(contacts: Vec<RawContact>, status: PermissionStatus) -> Self {
        Self { contacts, status }
    }

    /// An address book with access already granted.
    pub fn granted(contacts: Vec<RawContact>) -> Self {
        Self::new(contacts, PermissionStatus::Granted)
    }
}

#[async_trait]
impl ContactProvider for MemoryContactProvider {
    async fn permission_status(&self) -> anyhow::Result<PermissionStatus> {
        Ok(self.status)
    }

    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        Ok(self.status)
    }

    async fn enumerate_contacts(&self, _fields: &[ContactField]) -> anyhow::Result<Vec<RawContact>> {
        if !self.status.is_granted() {
            anyhow::bail!("contact access is {:?}", self.status);
        }
        Ok(self.contacts.clone())
    }
}
