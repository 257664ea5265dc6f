//! TaskLauncher - invocation descriptor の組み立て
//!
//! # 使用例
//! ```ignore
//! let future = TaskLauncher::new(TRAVERSE, &record.encode()).launch(&ctx)?;
//! let future = TaskLauncher::typed::<PrintKey>(&b'a').launch(&executor)?;
//! ```

use crate::domain::{TaskDescriptor, TaskKindId};
use crate::error::TaskError;
use crate::future::TaskFuture;
use crate::typed::{ArgLayout, Task};

/// Anything tasks can be launched through: the executor from the top level,
/// or a `Context` from inside a running handler.
pub trait Launch {
    fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError>;
}

/// Builder for one launch.
#[derive(Debug, Clone)]
pub struct TaskLauncher {
    kind: TaskKindId,
    args: Vec<u8>,
    expects_result: bool,
}

impl TaskLauncher {
    /// Copies `args`; the caller keeps its buffer.
    pub fn new(kind: TaskKindId, args: &[u8]) -> Self {
        Self {
            kind,
            args: args.to_vec(),
            expects_result: false,
        }
    }

    pub fn typed<T: Task>(args: &T::Args) -> Self {
        Self {
            kind: T::KIND,
            args: args.encode(),
            expects_result: T::RETURNS_VALUE,
        }
    }

    pub fn expects_result(mut self, expects_result: bool) -> Self {
        self.expects_result = expects_result;
        self
    }

    pub fn build(self) -> TaskDescriptor {
        TaskDescriptor::new(self.kind, &self.args, self.expects_result)
    }

    pub fn launch<L: Launch + ?Sized>(self, target: &L) -> Result<TaskFuture, TaskError> {
        target.launch(self.build())
    }
}

impl From<TaskLauncher> for TaskDescriptor {
    fn from(launcher: TaskLauncher) -> Self {
        launcher.build()
    }
}
