//! Status - executor の現在の状態
//!
//! `Executor::status()` と `shutdown()` の戻り値として使う。

use serde::{Deserialize, Serialize};

use crate::observability::InvocationCounts;
use crate::queue::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStatus {
    pub phase: Phase,
    pub worker_slots: usize,
    /// Slots not held by a running handler right now.
    pub available_slots: usize,
    pub counts: InvocationCounts,
}

impl ExecutorStatus {
    /// Nothing queued and nothing running.
    pub fn is_quiescent(&self) -> bool {
        self.counts.queued == 0 && self.counts.running == 0
    }
}
