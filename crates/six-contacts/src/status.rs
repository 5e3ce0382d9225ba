//! Observable coordinator state for UI consumers.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::permission::PermissionState;

/// Point-in-time view of the contact sync state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactsSnapshot {
    pub permission: PermissionState,
    pub is_loading: bool,
    pub is_syncing: bool,
    /// Number of contacts in the most recent device read.
    pub contact_count: usize,
}

/// Single writer side of the snapshot channel, shared by the coordinator's parts.
#[derive(Clone)]
pub(crate) struct StatusBoard {
    tx: Arc<watch::Sender<ContactsSnapshot>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ContactsSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> ContactsSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ContactsSnapshot> {
        self.tx.subscribe()
    }

    pub fn set_permission(&self, permission: PermissionState) {
        self.tx.send_if_modified(|s| {
            let changed = s.permission != permission;
            s.permission = permission;
            changed
        });
    }

    pub fn set_contact_count(&self, count: usize) {
        self.tx.send_if_modified(|s| {
            let changed = s.contact_count != count;
            s.contact_count = count;
            changed
        });
    }

    /// Raise an activity flag until the returned guard is dropped.
    pub fn begin(&self, activity: Activity) -> ActivityGuard {
        self.set_activity(activity, true);
        ActivityGuard {
            board: self.clone(),
            activity,
        }
    }

    fn set_activity(&self, activity: Activity, on: bool) {
        self.tx.send_modify(|s| match activity {
            Activity::Loading => s.is_loading = on,
            Activity::Syncing => s.is_syncing = on,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    Loading,
    Syncing,
}

/// Clears its activity flag on drop, including on early return or panic.
pub(crate) struct ActivityGuard {
    board: StatusBoard,
    activity: Activity,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.board.set_activity(self.activity, false);
    }
}
