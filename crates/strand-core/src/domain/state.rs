//! Invocation state machine.

use serde::{Deserialize, Serialize};

/// Invocation state.
///
/// State transitions:
/// - Queued -> Running -> Completed
/// - Queued -> Running -> Failed
/// - Queued -> Cancelled (immediate shutdown only; Running is never cancelled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl InvocationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvocationState::Completed | InvocationState::Failed | InvocationState::Cancelled
        )
    }

    /// Only queued invocations may be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(self, InvocationState::Queued)
    }
}
