//! Events - executor で発生したイベント
//!
//! EventSink に渡される。`seq` は ready queue のロック内で採番されるので、
//! enqueue 順そのものを表す。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{InvocationId, TaskKindId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutorEvent {
    Launched {
        invocation: InvocationId,
        seq: u64,
        kind: TaskKindId,
        parent: Option<InvocationId>,
        args: Vec<u8>,
    },
    Started {
        invocation: InvocationId,
        kind: TaskKindId,
    },
    Completed {
        invocation: InvocationId,
        kind: TaskKindId,
    },
    Failed {
        invocation: InvocationId,
        kind: TaskKindId,
        error: String,
    },
    Cancelled {
        invocation: InvocationId,
        kind: TaskKindId,
    },
}

impl ExecutorEvent {
    pub fn invocation(&self) -> InvocationId {
        match self {
            ExecutorEvent::Launched { invocation, .. }
            | ExecutorEvent::Started { invocation, .. }
            | ExecutorEvent::Completed { invocation, .. }
            | ExecutorEvent::Failed { invocation, .. }
            | ExecutorEvent::Cancelled { invocation, .. } => *invocation,
        }
    }

    pub fn kind(&self) -> TaskKindId {
        match self {
            ExecutorEvent::Launched { kind, .. }
            | ExecutorEvent::Started { kind, .. }
            | ExecutorEvent::Completed { kind, .. }
            | ExecutorEvent::Failed { kind, .. }
            | ExecutorEvent::Cancelled { kind, .. } => *kind,
        }
    }
}

/// An event stamped with the wall-clock time it was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ExecutorEvent,
}

impl EventRecord {
    pub fn now(event: ExecutorEvent) -> Self {
        Self {
            at: Utc::now(),
            event,
        }
    }
}
