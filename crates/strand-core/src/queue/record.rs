//! Invocation record: descriptor + promise + bookkeeping.

use std::time::Instant;

use crate::domain::{InvocationId, InvocationState, TaskDescriptor};
use crate::future::Promise;

/// A queued `(TaskDescriptor, Future)` pair awaiting execution.
///
/// The ready queue owns it while Queued; the dispatcher takes ownership on
/// dequeue and consumes it when the invocation reaches a terminal state.
#[derive(Debug)]
pub(crate) struct Invocation {
    pub(crate) id: InvocationId,
    pub(crate) descriptor: TaskDescriptor,
    pub(crate) promise: Promise,
    pub(crate) parent: Option<InvocationId>,
    pub(crate) state: InvocationState,
    /// Enqueue sequence, assigned by the queue.
    pub(crate) seq: u64,
    pub(crate) enqueued_at: Instant,
}

impl Invocation {
    pub(crate) fn new(
        id: InvocationId,
        descriptor: TaskDescriptor,
        promise: Promise,
        parent: Option<InvocationId>,
    ) -> Self {
        Self {
            id,
            descriptor,
            promise,
            parent,
            state: InvocationState::Queued,
            seq: 0,
            enqueued_at: Instant::now(),
        }
    }

    /// Queued -> Running.
    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.state, InvocationState::Queued);
        self.state = InvocationState::Running;
    }
}
