//! Contact Loader - cached, coalesced device contact reads.
//!
//! # State machine
//!
//! `idle → loading → idle`. While `loading`, every new caller attaches to
//! the running read; there is never more than one device enumeration at a
//! time. In `idle`, a non-empty read younger than the freshness window is
//! returned from cache.
//!
//! A failed read leaves the cache untouched, so stale-but-valid contacts
//! survive until the next successful read.

use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ContactSyncConfig;
use crate::contact::RawContact;
use crate::error::{Error, Result};
use crate::flight::{lock, SingleFlight};
use crate::permission::PermissionGate;
use crate::provider::ContactProvider;
use crate::status::{Activity, StatusBoard};

/// Contacts from one device read, shared by every waiter.
pub type ContactList = Arc<[RawContact]>;

/// The most recent device read.
#[derive(Debug, Clone)]
pub struct LoadCache {
    contacts: ContactList,
    /// `None` once invalidated.
    loaded_at: Option<Instant>,
}

impl LoadCache {
    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    /// Whether this read may stand in for a new one at `now`.
    pub fn is_fresh(&self, now: Instant, config: &ContactSyncConfig) -> bool {
        !self.contacts.is_empty()
            && self
                .loaded_at
                .is_some_and(|at| now.saturating_duration_since(at) < config.freshness_window)
    }
}

struct LoaderInner {
    provider: Arc<dyn ContactProvider>,
    gate: PermissionGate,
    board: StatusBoard,
    config: ContactSyncConfig,
    cache: Mutex<Option<LoadCache>>,
}

/// Reads device contacts with caching and at most one concurrent read.
pub struct ContactLoader {
    inner: Arc<LoaderInner>,
    flight: SingleFlight<ContactList>,
}

impl ContactLoader {
    pub(crate) fn new(
        provider: Arc<dyn ContactProvider>,
        gate: PermissionGate,
        board: StatusBoard,
        config: ContactSyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                provider,
                gate,
                board,
                config,
                cache: Mutex::new(None),
            }),
            flight: SingleFlight::new(),
        }
    }

    /// Load device contacts.
    ///
    /// Attaches to an in-flight read if there is one, otherwise serves a
    /// fresh cache, otherwise reads the device. Without permission the
    /// result is empty; this method never prompts.
    pub async fn load(&self) -> Result<ContactList> {
        if let Some(pending) = self.flight.pending() {
            debug!("Attaching to in-flight contact load");
            return pending.await;
        }

        if let Some(cached) = self.fresh_cache() {
            debug!(contacts = cached.len(), "Serving contacts from cache");
            return Ok(cached);
        }

        let inner = Arc::clone(&self.inner);
        let (pending, started) = self.flight.join(move || read_device(inner));
        if !started {
            debug!("Attaching to in-flight contact load");
        }
        pending.await
    }

    /// Force the next [`load`](Self::load) to read the device.
    pub fn invalidate(&self) {
        if let Some(cache) = lock(&self.inner.cache).as_mut() {
            cache.loaded_at = None;
        }
    }

    /// Contacts from the most recent successful read.
    pub fn contacts(&self) -> ContactList {
        lock(&self.inner.cache)
            .as_ref()
            .map(|c| Arc::clone(&c.contacts))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Whether a device read is running.
    pub fn is_loading(&self) -> bool {
        self.flight.is_running()
    }

    fn fresh_cache(&self) -> Option<ContactList> {
        let now = Instant::now();
        lock(&self.inner.cache)
            .as_ref()
            .filter(|c| c.is_fresh(now, &self.inner.config))
            .map(|c| Arc::clone(&c.contacts))
    }
}

async fn read_device(inner: Arc<LoaderInner>) -> Result<ContactList> {
    let _loading = inner.board.begin(Activity::Loading);

    let status = inner.gate.check().await?;
    if !status.is_granted() {
        debug!(?status, "Contact access not granted; nothing to load");
        return Ok(Arc::from(Vec::new()));
    }

    let contacts = inner
        .provider
        .enumerate_contacts(&inner.config.fields)
        .await
        .map_err(|e| {
            warn!(error = %format!("{e:#}"), "Device contact enumeration failed");
            Error::Load(format!("{e:#}"))
        })?;

    let contacts: ContactList = contacts.into();
    *lock(&inner.cache) = Some(LoadCache {
        contacts: Arc::clone(&contacts),
        loaded_at: Some(Instant::now()),
    });
    inner.board.set_contact_count(contacts.len());

    info!(contacts = contacts.len(), "Loaded device contacts");
    Ok(contacts)
}
