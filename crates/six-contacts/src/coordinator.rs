//! Sync Coordinator - permission, load and remote sync as one coalesced cycle.
//!
//! # Guarantees
//!
//! - At most one check-and-load cycle and at most one sync run at a time.
//!   Concurrent callers attach to the running one and observe its outcome,
//!   so rapid repeated triggers never prompt twice or sync twice.
//! - Within a cycle the order is strictly check → request (if needed) →
//!   load → optional sync.
//! - Operations are never cancelled. A caller that stops awaiting leaves the
//!   operation running to completion in the background.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ContactSyncConfig;
use crate::error::{Error, Result};
use crate::flight::SingleFlight;
use crate::loader::{ContactList, ContactLoader};
use crate::normalize::normalize;
use crate::permission::{PermissionGate, PermissionState};
use crate::provider::{ContactProvider, SyncBackend, SyncReport};
use crate::session::Session;
use crate::status::{Activity, ContactsSnapshot, StatusBoard};

/// Result of a check-and-load or reload cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Nobody is signed in; nothing was done.
    NoUser,
    /// Permission is not granted; nothing was loaded.
    NotGranted { permission: PermissionState },
    /// Contacts were loaded, and synced if `report` is set.
    Loaded {
        contacts: usize,
        report: Option<SyncReport>,
    },
}

impl CheckOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Loaded { report, .. } => report.as_ref(),
            _ => None,
        }
    }
}

struct SyncInner {
    gate: PermissionGate,
    loader: ContactLoader,
    backend: Arc<dyn SyncBackend>,
    session: Session,
    board: StatusBoard,
    checking: SingleFlight<CheckOutcome>,
    syncing: SingleFlight<SyncReport>,
}

/// Contact sync coordinator handed to UI consumers. Cloning shares state.
#[derive(Clone)]
pub struct ContactSync {
    inner: Arc<SyncInner>,
}

impl ContactSync {
    pub fn new(
        provider: Arc<dyn ContactProvider>,
        backend: Arc<dyn SyncBackend>,
        session: Session,
        config: ContactSyncConfig,
    ) -> Self {
        let board = StatusBoard::new();
        let gate = PermissionGate::new(Arc::clone(&provider), board.clone());
        let loader = ContactLoader::new(provider, gate.clone(), board.clone(), config);

        Self {
            inner: Arc::new(SyncInner {
                gate,
                loader,
                backend,
                session,
                board,
                checking: SingleFlight::new(),
                syncing: SingleFlight::new(),
            }),
        }
    }

    /// Check permission (prompting if needed), load contacts, and sync them
    /// when `auto_sync` is set and the load is non-empty.
    ///
    /// A caller arriving while a cycle runs attaches to it, whatever its own
    /// `auto_sync` value.
    pub async fn check_and_load(&self, auto_sync: bool) -> Result<CheckOutcome> {
        if !self.inner.session.is_signed_in() {
            debug!("No signed-in user; skipping contact check");
            return Ok(CheckOutcome::NoUser);
        }

        let inner = Arc::clone(&self.inner);
        let (pending, started) = self
            .inner
            .checking
            .join(move || async move { inner.check_and_load(auto_sync).await });
        if !started {
            debug!("Attaching to in-flight contact check");
        }
        pending.await
    }

    /// Sync `contacts`, or the most recently loaded contacts, to the backend.
    ///
    /// Attaches to an in-flight sync instead of queueing a second one.
    pub async fn sync(&self, contacts: Option<ContactList>) -> Result<SyncReport> {
        self.inner.sync(contacts).await
    }

    /// Drop cache freshness, re-check permission and, if granted, load and sync.
    pub async fn reload(&self) -> Result<CheckOutcome> {
        let inner = &self.inner;
        inner.loader.invalidate();

        let status = inner.gate.check().await?;
        if !status.is_granted() {
            info!(?status, "Reload skipped; contact access not granted");
            return Ok(CheckOutcome::NotGranted {
                permission: status.into(),
            });
        }

        let contacts = inner.loader.load().await?;
        let report = if contacts.is_empty() {
            None
        } else {
            Some(inner.sync(Some(Arc::clone(&contacts))).await?)
        };

        Ok(CheckOutcome::Loaded {
            contacts: contacts.len(),
            report,
        })
    }

    /// Sync with whatever is needed first: a full check-and-load when access
    /// or contacts are missing, a plain sync otherwise.
    pub async fn sync_now(&self) -> Result<CheckOutcome> {
        let contacts = self.contacts();
        if !self.snapshot().permission.is_granted() || contacts.is_empty() {
            return self.check_and_load(true).await;
        }

        let report = self.sync(Some(Arc::clone(&contacts))).await?;
        Ok(CheckOutcome::Loaded {
            contacts: contacts.len(),
            report: Some(report),
        })
    }

    /// Contacts from the most recent device read.
    pub fn contacts(&self) -> ContactList {
        self.inner.loader.contacts()
    }

    pub fn snapshot(&self) -> ContactsSnapshot {
        self.inner.board.snapshot()
    }

    pub fn permission(&self) -> PermissionState {
        self.snapshot().permission
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading
    }

    pub fn is_syncing(&self) -> bool {
        self.snapshot().is_syncing
    }

    pub fn subscribe(&self) -> watch::Receiver<ContactsSnapshot> {
        self.inner.board.subscribe()
    }

    /// Attach a view. With `check_on_attach`, a background
    /// `check_and_load(true)` runs once for this attachment.
    pub fn attach(&self, check_on_attach: bool) -> ContactsView {
        let initial_check = check_on_attach.then(|| {
            let sync = self.clone();
            tokio::spawn(async move {
                let outcome = sync.check_and_load(true).await;
                if let Err(e) = &outcome {
                    warn!(error = %e, "Contact check on attach failed");
                }
                outcome
            })
        });

        debug!(check_on_attach, "Contacts view attached");
        ContactsView {
            rx: self.subscribe(),
            sync: self.clone(),
            initial_check,
        }
    }
}

impl std::fmt::Debug for ContactSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactSync")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SyncInner {
    async fn check_and_load(self: Arc<Self>, auto_sync: bool) -> Result<CheckOutcome> {
        let outcome = self.run_check(auto_sync).await;
        match &outcome {
            Ok(outcome) => debug!(?outcome, "Contact check finished"),
            Err(Error::PermissionDenied(state)) => {
                warn!(%state, "Contact permission not granted")
            }
            Err(e) => {
                error!(error = %e, "Contact check failed");
                self.gate.mark_error();
            }
        }
        outcome
    }

    async fn run_check(self: &Arc<Self>, auto_sync: bool) -> Result<CheckOutcome> {
        let mut status = self.gate.check().await?;
        if !status.is_granted() {
            status = self.gate.request().await?;
        }
        if !status.is_granted() {
            return Err(Error::PermissionDenied(status.into()));
        }

        let contacts = self.loader.load().await?;
        let report = if auto_sync && !contacts.is_empty() {
            Some(self.sync(Some(Arc::clone(&contacts))).await?)
        } else {
            None
        };

        Ok(CheckOutcome::Loaded {
            contacts: contacts.len(),
            report,
        })
    }

    async fn sync(self: &Arc<Self>, contacts: Option<ContactList>) -> Result<SyncReport> {
        let inner = Arc::clone(self);
        let (pending, started) = self
            .syncing
            .join(move || async move { inner.run_sync(contacts).await });
        if !started {
            debug!("Attaching to in-flight contact sync");
        }
        pending.await
    }

    async fn run_sync(&self, contacts: Option<ContactList>) -> Result<SyncReport> {
        let _syncing = self.board.begin(Activity::Syncing);

        let contacts = contacts.unwrap_or_else(|| self.loader.contacts());
        let phones = normalize(&contacts);
        if phones.is_empty() {
            warn!(contacts = contacts.len(), "No contacts available to sync");
            return Err(Error::NoContacts);
        }

        info!(
            contacts = contacts.len(),
            identifiers = phones.len(),
            "Syncing contacts"
        );
        let report = self.backend.sync_contacts(&phones).await.map_err(|e| {
            error!(error = %format!("{e:#}"), "Contact sync failed");
            Error::Sync(format!("{e:#}"))
        })?;

        info!(
            matched = report.matched,
            connected = report.connected,
            failed = report.failed,
            "Contact sync finished"
        );
        Ok(report)
    }
}

/// A UI attachment to a [`ContactSync`]. Dropping it detaches.
pub struct ContactsView {
    rx: watch::Receiver<ContactsSnapshot>,
    sync: ContactSync,
    initial_check: Option<JoinHandle<Result<CheckOutcome>>>,
}

impl ContactsView {
    pub fn snapshot(&self) -> ContactsSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change; `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<ContactsSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Outcome of the check started on attach, if one was requested and not
    /// yet taken.
    pub async fn initial_check(&mut self) -> Option<Result<CheckOutcome>> {
        let handle = self.initial_check.take()?;
        Some(match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(Error::Task(e.to_string())),
        })
    }

    pub fn sync(&self) -> &ContactSync {
        &self.sync
    }
}

impl Drop for ContactsView {
    fn drop(&mut self) {
        // The attach-time check keeps running; only the subscription ends.
        debug!("Contacts view detached");
    }
}
