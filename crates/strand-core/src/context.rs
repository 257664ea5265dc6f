//! Context - running task に渡される launch 権限
//!
//! invocation ごとに新しく作られ、その invocation を親として記録する。

use std::fmt;
use std::sync::Arc;

use crate::app::executor::Shared;
use crate::domain::{InvocationId, TaskDescriptor, TaskKindId};
use crate::error::TaskError;
use crate::future::TaskFuture;
use crate::launcher::{Launch, TaskLauncher};
use crate::queue::LaunchOrigin;
use crate::typed::Task;

/// Capability object passed into a running handler.
#[derive(Clone)]
pub struct Context {
    shared: Arc<Shared>,
    invocation: InvocationId,
    kind: TaskKindId,
    leaf: bool,
}

impl Context {
    pub(crate) fn new(
        shared: Arc<Shared>,
        invocation: InvocationId,
        kind: TaskKindId,
        leaf: bool,
    ) -> Self {
        Self {
            shared,
            invocation,
            kind,
            leaf,
        }
    }

    /// Invocation this context is bound to.
    pub fn invocation_id(&self) -> InvocationId {
        self.invocation
    }

    pub fn kind(&self) -> TaskKindId {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Launch a child task. Never waits; the child runs on whichever worker
    /// picks it up.
    pub fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError> {
        if self.leaf {
            return Err(TaskError::LeafTaskLaunch(self.kind));
        }
        self.shared
            .submit(descriptor, LaunchOrigin::Task(self.invocation))
    }

    pub fn launch_typed<T: Task>(&self, args: &T::Args) -> Result<TaskFuture, TaskError> {
        TaskLauncher::typed::<T>(args).launch(self)
    }
}

impl Launch for Context {
    fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError> {
        Context::launch(self, descriptor)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("invocation", &self.invocation)
            .field("kind", &self.kind)
            .field("leaf", &self.leaf)
            .finish_non_exhaustive()
    }
}
