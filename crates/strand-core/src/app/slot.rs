//! Worker slots.
//!
//! A slot is one permit of the executor's semaphore. The permit of a running
//! handler lives in a task-local `WorkerSlot`, so `TaskFuture::wait` can hand
//! it back while the handler is suspended and take one again on resumption.
//!
//! A handler whose wait is dropped before it resumes cannot wait for a permit
//! any more. If none is free it keeps running on an owed slot, and the next
//! permit that comes back to the pool is withheld to cover it.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

tokio::task_local! {
    static CURRENT_SLOT: Arc<WorkerSlot>;
}

/// The executor's worker slots.
pub(crate) struct SlotPool {
    semaphore: Arc<Semaphore>,
    /// Owed slots not yet covered by a withheld permit.
    unpaid: AtomicUsize,
}

impl SlotPool {
    pub(crate) fn new(slots: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(slots)),
            unpaid: AtomicUsize::new(0),
        })
    }

    /// Wait for a free permit, settling owed slots first.
    ///
    /// Returns `None` only if the semaphore was closed.
    pub(crate) async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        loop {
            let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
            if !self.take_unpaid() {
                return Some(permit);
            }
            // Now held by the handler running on the owed slot.
            permit.forget();
            tracing::trace!("withheld a permit for an owed slot");
        }
    }

    pub(crate) fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).try_acquire_owned().ok()
    }

    fn owe(&self) {
        self.unpaid.fetch_add(1, Ordering::AcqRel);
    }

    /// An owed slot is no longer in use.
    fn settle(&self) {
        // Either the debt is still open, or a withheld permit has to come back.
        if !self.take_unpaid() {
            self.semaphore.add_permits(1);
        }
    }

    fn take_unpaid(&self) -> bool {
        self.unpaid
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

enum Held {
    Permit(OwnedSemaphorePermit),
    Owed,
    Free,
}

pub(crate) struct WorkerSlot {
    pool: Arc<SlotPool>,
    held: Mutex<Held>,
}

impl WorkerSlot {
    pub(crate) fn new(pool: Arc<SlotPool>, permit: OwnedSemaphorePermit) -> Arc<Self> {
        Arc::new(Self {
            pool,
            held: Mutex::new(Held::Permit(permit)),
        })
    }

    /// Run `fut` with `slot` as the current task's slot.
    pub(crate) async fn scope<F: Future>(slot: Arc<Self>, fut: F) -> F::Output {
        CURRENT_SLOT.scope(slot, fut).await
    }

    /// Slot of the handler running on this task, if any.
    pub(crate) fn current() -> Option<Arc<Self>> {
        CURRENT_SLOT.try_with(Arc::clone).ok()
    }

    /// Whether this handler currently counts against the slot limit.
    pub(crate) fn is_held(&self) -> bool {
        !matches!(*self.guard(), Held::Free)
    }

    /// Give the slot back to the pool. Returns false if it was not held.
    pub(crate) fn release(&self) -> bool {
        match std::mem::replace(&mut *self.guard(), Held::Free) {
            Held::Permit(permit) => {
                drop(permit);
                true
            }
            Held::Owed => {
                self.pool.settle();
                true
            }
            Held::Free => false,
        }
    }

    /// Release the slot until the returned guard is resumed or dropped.
    pub(crate) fn suspend(self: &Arc<Self>) -> Option<Suspension> {
        self.release().then(|| Suspension {
            slot: Arc::clone(self),
            resumed: false,
        })
    }

    /// Wait for a free permit and hold it again.
    async fn reacquire(&self) {
        // The semaphore is never closed while handlers are alive.
        if let Some(permit) = self.pool.acquire().await {
            *self.guard() = Held::Permit(permit);
        }
    }

    /// Take a slot without waiting, owing one if none is free.
    fn reclaim_now(&self) {
        let mut held = self.guard();
        if !matches!(*held, Held::Free) {
            return;
        }
        *held = match self.pool.try_acquire() {
            Some(permit) => Held::Permit(permit),
            None => {
                self.pool.owe();
                tracing::debug!("wait abandoned with no free slot; running on an owed slot");
                Held::Owed
            }
        };
    }

    fn guard(&self) -> MutexGuard<'_, Held> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A released slot that must be taken back before the handler goes on.
///
/// Dropping it unresumed (the wait was cancelled) takes the slot back at once.
pub(crate) struct Suspension {
    slot: Arc<WorkerSlot>,
    resumed: bool,
}

impl Suspension {
    pub(crate) async fn resume(mut self) {
        self.slot.reacquire().await;
        self.resumed = true;
    }
}

impl Drop for Suspension {
    fn drop(&mut self) {
        if !self.resumed {
            self.slot.reclaim_now();
        }
    }
}
