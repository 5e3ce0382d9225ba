//! Test doubles for the OS contact provider and the sync backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::contact::{ContactField, RawContact};
use crate::flight::lock;
use crate::normalize::NormalizedPhoneSet;
use crate::permission::PermissionStatus;
use crate::provider::{ContactProvider, SyncBackend, SyncReport};

/// Two contacts sharing one number in different formats.
pub(crate) fn sample_contacts() -> Vec<RawContact> {
    vec![
        RawContact::named("Ada").with_phone("555-123-4567"),
        RawContact::named("Grace")
            .with_phone("(555)123-4567")
            .with_phone("555-999-0000"),
    ]
}

pub(crate) struct MockProvider {
    status: Mutex<PermissionStatus>,
    request_answer: Option<PermissionStatus>,
    contacts: Vec<RawContact>,
    delay: Duration,
    fail_permission: bool,
    fail_enumeration: AtomicBool,
    permission_checks: AtomicUsize,
    requests: AtomicUsize,
    enumerations: AtomicUsize,
}

impl MockProvider {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            request_answer: None,
            contacts: Vec::new(),
            delay: Duration::ZERO,
            fail_permission: false,
            fail_enumeration: AtomicBool::new(false),
            permission_checks: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
            enumerations: AtomicUsize::new(0),
        }
    }

    pub fn granted(contacts: Vec<RawContact>) -> Self {
        Self::new(PermissionStatus::Granted).with_contacts(contacts)
    }

    pub fn with_contacts(mut self, contacts: Vec<RawContact>) -> Self {
        self.contacts = contacts;
        self
    }

    pub fn answer_request_with(mut self, status: PermissionStatus) -> Self {
        self.request_answer = Some(status);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_permission(mut self) -> Self {
        self.fail_permission = true;
        self
    }

    pub fn failing_enumeration(self) -> Self {
        self.set_fail_enumeration(true);
        self
    }

    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    pub fn permission_checks(&self) -> usize {
        self.permission_checks.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl ContactProvider for MockProvider {
    async fn permission_status(&self) -> anyhow::Result<PermissionStatus> {
        self.permission_checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_permission {
            anyhow::bail!("permission service unavailable");
        }
        Ok(*lock(&self.status))
    }

    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_permission {
            anyhow::bail!("permission service unavailable");
        }
        let mut status = lock(&self.status);
        if let Some(answer) = self.request_answer {
            *status = answer;
        }
        Ok(*status)
    }

    async fn enumerate_contacts(&self, _fields: &[ContactField]) -> anyhow::Result<Vec<RawContact>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_enumeration.load(Ordering::SeqCst) {
            anyhow::bail!("contacts provider unavailable");
        }
        Ok(self.contacts.clone())
    }
}

pub(crate) struct MockBackend {
    delay: Duration,
    failing: AtomicBool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockBackend {
    pub fn ok() -> Self {
        Self {
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let backend = Self::ok();
        backend.set_failing(true);
        backend
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl SyncBackend for MockBackend {
    async fn sync_contacts(&self, phones: &NormalizedPhoneSet) -> anyhow::Result<SyncReport> {
        lock(&self.calls).push(phones.as_slice().to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("backend returned 503");
        }
        Ok(SyncReport {
            submitted: phones.len(),
            matched: phones.len(),
            connected: phones.len(),
            failed: 0,
        })
    }
}
