//! EventSink port - executor イベントの通知先
//!
//! 誰も wait しない future の失敗も、ここには必ず届く。

use crate::domain::ExecutorEvent;

/// Observer of executor events.
///
/// `emit` is called on the launching or executing task and must not block for
/// long. No executor lock is held while it runs, so it may read the status or
/// launch tasks; events it causes are delivered after it returns.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ExecutorEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &ExecutorEvent) {}
}
