//! Executor lifecycle phase, as seen by the ready queue.

use serde::{Deserialize, Serialize};

/// Phase transitions: Accepting -> Draining -> Closed, or Accepting -> Closed.
///
/// - Accepting: every launch is accepted.
/// - Draining: only launches from running tasks are accepted.
/// - Closed: every launch is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Accepting,
    Draining,
    Closed,
}

/// Who is launching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaunchOrigin {
    External,
    Task(crate::domain::InvocationId),
}

impl LaunchOrigin {
    pub(crate) fn parent(self) -> Option<crate::domain::InvocationId> {
        match self {
            LaunchOrigin::External => None,
            LaunchOrigin::Task(id) => Some(id),
        }
    }
}

impl Phase {
    pub(crate) fn admits(self, origin: LaunchOrigin) -> bool {
        match self {
            Phase::Accepting => true,
            Phase::Draining => matches!(origin, LaunchOrigin::Task(_)),
            Phase::Closed => false,
        }
    }
}
