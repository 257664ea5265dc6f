//! Outbox - executor イベントの配送
//!
//! # フロー
//! 1. `enqueue()` でイベントを積む (ready queue のロック下でも可)
//! 2. `publish()` でロックの外から `EventSink::emit` に渡す
//!
//! 配送は常に 1 つの task だけが行うので、積んだ順に届く。
//! sink が emit の中で status を見たり launch しても詰まらない。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::domain::ExecutorEvent;
use crate::ports::EventSink;

pub(crate) struct EventOutbox {
    pending: Mutex<VecDeque<ExecutorEvent>>,
    /// Held by the task currently delivering.
    publishing: Mutex<()>,
    sink: Arc<dyn EventSink>,
}

impl EventOutbox {
    pub(crate) fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            publishing: Mutex::new(()),
            sink,
        }
    }

    /// Queue an event without delivering it.
    pub(crate) fn enqueue(&self, event: ExecutorEvent) {
        self.pending().push_back(event);
    }

    /// Queue an event and deliver everything pending.
    pub(crate) fn emit(&self, event: ExecutorEvent) {
        self.enqueue(event);
        self.publish();
    }

    /// Deliver pending events in order.
    ///
    /// Returns at once if another task (or an outer call on this one) is
    /// already delivering; that publisher picks the events up.
    pub(crate) fn publish(&self) {
        loop {
            let publishing = match self.publishing.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            while let Some(event) = self.next() {
                self.sink.emit(&event);
            }
            drop(publishing);

            // An event queued after the last `next` but before the unlock
            // found the lock taken.
            if self.pending().is_empty() {
                return;
            }
        }
    }

    fn next(&self) -> Option<ExecutorEvent> {
        self.pending().pop_front()
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<ExecutorEvent>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
