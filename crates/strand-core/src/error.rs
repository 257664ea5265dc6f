use std::sync::Arc;

use thiserror::Error;

use crate::domain::{InvocationId, TaskKindId};

/// Boxed error returned by task handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by registration, launch and task execution.
///
/// `Clone` so that a stored failure can be handed to every waiter of the same
/// future.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("unknown task kind {0}")]
    UnknownTaskKind(TaskKindId),

    #[error("duplicate task kind {0}")]
    DuplicateTaskKind(TaskKindId),

    #[error("argument size mismatch for task kind {kind}: expected {expected} bytes, got {actual}")]
    ArgumentSizeMismatch {
        kind: TaskKindId,
        expected: usize,
        actual: usize,
    },

    #[error("handler for task kind {kind} failed: {source}")]
    TaskHandlerFailure {
        kind: TaskKindId,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    #[error("executor is shutting down")]
    ShutdownInProgress,

    #[error("leaf task kind {0} cannot launch further tasks")]
    LeafTaskLaunch(TaskKindId),

    #[error("invocation {invocation} was cancelled before it ran")]
    Cancelled { invocation: InvocationId },
}

impl TaskError {
    pub(crate) fn handler_failure(kind: TaskKindId, source: BoxError) -> Self {
        TaskError::TaskHandlerFailure {
            kind,
            source: Arc::from(source),
        }
    }
}

/// A handler panicked instead of returning.
#[derive(Debug, Error)]
#[error("handler panicked: {0}")]
pub struct HandlerPanic(pub String);
