//! Single-flight execution: at most one running instance of an operation.
//!
//! The first caller spawns the operation as a background task and parks a
//! shared handle to its outcome. Later callers clone that handle instead of
//! starting another run. The task clears the handle itself when it
//! finishes, so a waiter that stops awaiting never strands the slot.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{Error, Result};

/// Shared handle to the outcome of a running operation.
pub(crate) type Pending<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Flight<T> {
    id: u64,
    outcome: Pending<T>,
}

pub(crate) struct SingleFlight<T> {
    slot: Arc<Mutex<Option<Flight<T>>>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Handle to the running operation, if any.
    pub fn pending(&self) -> Option<Pending<T>> {
        lock(&self.slot).as_ref().map(|f| f.outcome.clone())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Attach to the running operation, or spawn `start()` if none is running.
    ///
    /// Returns the outcome handle and whether this call started the run.
    pub fn join<F, Fut>(&self, start: F) -> (Pending<T>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(flight) = slot.as_ref() {
            return (flight.outcome.clone(), false);
        }

        let op = start();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let release = Release {
            slot: Arc::clone(&self.slot),
            id,
        };
        let handle = tokio::spawn(async move {
            let _release = release;
            op.await
        });

        let outcome = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Task(e.to_string())),
            }
        }
        .boxed()
        .shared();

        *slot = Some(Flight {
            id,
            outcome: outcome.clone(),
        });
        (outcome, true)
    }
}

/// Empties the slot when the owning task ends.
struct Release<T> {
    slot: Arc<Mutex<Option<Flight<T>>>>,
    id: u64,
}

impl<T> Drop for Release<T> {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|f| f.id == self.id) {
            *slot = None;
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
