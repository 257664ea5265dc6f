//! In-memory ready queue shared by launchers and the dispatcher.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::{Invocation, LaunchOrigin, Phase, QueuePolicy};
use crate::domain::InvocationState;
use crate::error::TaskError;
use crate::observability::InvocationCounts;

struct ReadyQueueState {
    /// Ready invocations, in enqueue order.
    ready: VecDeque<Invocation>,

    phase: Phase,

    /// Next enqueue sequence number.
    next_seq: u64,

    /// Queued + dequeued-but-not-finished invocations.
    outstanding: usize,

    counts: InvocationCounts,
}

/// Ready queue.
///
/// Design:
/// - `push` is synchronous and never waits: launching must not block.
/// - The std `Mutex` is never held across an await.
/// - Every invocation is handed out by `pop` exactly once.
pub(crate) struct ReadyQueue {
    state: Mutex<ReadyQueueState>,
    policy: QueuePolicy,
    /// Signalled on push and on close.
    ready_notify: Notify,
    /// Signalled when `outstanding` drops to zero.
    idle_notify: Notify,
}

impl ReadyQueue {
    pub(crate) fn new(policy: QueuePolicy) -> Self {
        Self {
            state: Mutex::new(ReadyQueueState {
                ready: VecDeque::new(),
                phase: Phase::Accepting,
                next_seq: 0,
                outstanding: 0,
                counts: InvocationCounts::default(),
            }),
            policy,
            ready_notify: Notify::new(),
            idle_notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReadyQueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an invocation. Returns its enqueue sequence number.
    #[cfg(test)]
    pub(crate) fn push(&self, invocation: Invocation, origin: LaunchOrigin) -> Result<u64, TaskError> {
        self.push_with(invocation, origin, |_| {})
    }

    /// Like `push`, calling `announce` with the sequenced invocation before
    /// any worker can dequeue it.
    ///
    /// `announce` runs under the queue lock and must not call back into the
    /// queue.
    pub(crate) fn push_with(
        &self,
        mut invocation: Invocation,
        origin: LaunchOrigin,
        announce: impl FnOnce(&Invocation),
    ) -> Result<u64, TaskError> {
        let seq = {
            let mut state = self.lock();
            if !state.phase.admits(origin) {
                return Err(TaskError::ShutdownInProgress);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            invocation.seq = seq;
            announce(&invocation);
            state.ready.push_back(invocation);
            state.outstanding += 1;
            state.counts.launched += 1;
            state.counts.queued += 1;
            seq
        };
        self.ready_notify.notify_one();
        Ok(seq)
    }

    /// Dequeue the next invocation according to the policy.
    ///
    /// Waits while the queue is empty; returns `None` once the queue is closed
    /// and empty. The invocation stays counted as queued until `start`.
    pub(crate) async fn pop(&self) -> Option<Invocation> {
        loop {
            let notified = self.ready_notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between check and await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(invocation) = self.policy.take(&mut state.ready) {
                    return Some(invocation);
                }
                if state.phase == Phase::Closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Mark a dequeued invocation Running once it holds a worker slot.
    ///
    /// Returns false if the queue closed meanwhile; the invocation is then
    /// marked Cancelled and counted as such.
    pub(crate) fn start(&self, invocation: &mut Invocation) -> bool {
        let idle = {
            let mut state = self.lock();
            state.counts.queued -= 1;
            if state.phase != Phase::Closed {
                invocation.start();
                state.counts.running += 1;
                return true;
            }
            invocation.state = InvocationState::Cancelled;
            state.counts.cancelled += 1;
            state.outstanding = state.outstanding.saturating_sub(1);
            state.outstanding == 0
        };
        if idle {
            self.idle_notify.notify_waiters();
        }
        false
    }

    /// Record that a started invocation reached `terminal`.
    pub(crate) fn finish(&self, terminal: InvocationState) {
        debug_assert!(terminal.is_terminal());
        let idle = {
            let mut state = self.lock();
            state.counts.running = state.counts.running.saturating_sub(1);
            match terminal {
                InvocationState::Failed => state.counts.failed += 1,
                InvocationState::Cancelled => state.counts.cancelled += 1,
                _ => state.counts.completed += 1,
            }
            state.outstanding = state.outstanding.saturating_sub(1);
            state.outstanding == 0
        };
        if idle {
            self.idle_notify.notify_waiters();
        }
    }

    /// Stop accepting external launches.
    pub(crate) fn begin_drain(&self) {
        let mut state = self.lock();
        if state.phase == Phase::Accepting {
            state.phase = Phase::Draining;
        }
    }

    /// Reject every further launch and hand back the invocations that were
    /// still queued, marked Cancelled.
    pub(crate) fn close(&self) -> Vec<Invocation> {
        let (cancelled, idle) = {
            let mut state = self.lock();
            state.phase = Phase::Closed;
            let mut cancelled: Vec<Invocation> = state.ready.drain(..).collect();
            for invocation in &mut cancelled {
                debug_assert!(invocation.state.is_cancellable());
                invocation.state = InvocationState::Cancelled;
            }
            let n = cancelled.len();
            state.counts.queued -= n;
            state.counts.cancelled += n;
            state.outstanding = state.outstanding.saturating_sub(n);
            (cancelled, state.outstanding == 0)
        };
        self.ready_notify.notify_waiters();
        if idle {
            self.idle_notify.notify_waiters();
        }
        cancelled
    }

    /// Wait until no invocation is queued or running.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lock().outstanding == 0 {
                return;
            }

            notified.await;
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub(crate) fn counts(&self) -> InvocationCounts {
        self.lock().counts.clone()
    }
}
