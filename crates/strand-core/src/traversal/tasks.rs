use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::arena::{NodeRecord, Tree};
use crate::app::ExecutorBuilder;
use crate::context::Context;
use crate::domain::{ProcessorConstraint, ProcessorKind, TaskDescriptor, TaskKindId};
use crate::error::{BoxError, TaskError};
use crate::future::{TaskFuture, TaskValue};
use crate::launcher::TaskLauncher;
use crate::typed::{Handler, Task};

pub const TOP_LEVEL: TaskKindId = TaskKindId::new(0);
pub const TRAVERSE: TaskKindId = TaskKindId::new(1);
pub const PRINT_KEY: TaskKindId = TaskKindId::new(2);

const ON_LATENCY_CORES: ProcessorConstraint =
    ProcessorConstraint::Only(ProcessorKind::LatencyOptimized);

/// Whether a traversal waits for what it launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Launch and move on. Sibling output may interleave.
    #[default]
    FireAndForget,
    /// Wait for each launch before the next one: output is pre-order.
    AwaitChildren,
}

/// Where printed keys go.
pub trait KeyOutput: Send + Sync {
    fn emit(&self, key: u8) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutKeys;

impl KeyOutput for StdoutKeys {
    fn emit(&self, key: u8) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(&[key])?;
        out.flush()
    }
}

/// Keeps keys in the order they were emitted.
#[derive(Debug, Default)]
pub struct CollectedKeys {
    keys: Mutex<Vec<u8>>,
}

impl CollectedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<u8> {
        self.guard().clone()
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.guard()).into_owned()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<u8>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyOutput for CollectedKeys {
    fn emit(&self, key: u8) -> io::Result<()> {
        self.guard().push(key);
        Ok(())
    }
}

pub struct TopLevel;

impl Task for TopLevel {
    const KIND: TaskKindId = TOP_LEVEL;
    const NAME: &'static str = "top_level";
    const PROCESSOR: ProcessorConstraint = ON_LATENCY_CORES;
    type Args = ();
}

pub struct Traverse;

impl Task for Traverse {
    const KIND: TaskKindId = TRAVERSE;
    const NAME: &'static str = "traverse";
    const PROCESSOR: ProcessorConstraint = ON_LATENCY_CORES;
    type Args = NodeRecord;
}

pub struct PrintKey;

impl Task for PrintKey {
    const KIND: TaskKindId = PRINT_KEY;
    const NAME: &'static str = "print key";
    const LEAF: bool = true;
    const PROCESSOR: ProcessorConstraint = ON_LATENCY_CORES;
    type Args = u8;
}

/// Launches the traversal of the root and waits for it.
pub struct TopLevelHandler {
    tree: Arc<Tree>,
}

impl TopLevelHandler {
    pub fn new(tree: Arc<Tree>) -> Self {
        Self { tree }
    }
}

#[async_trait]
impl Handler<TopLevel> for TopLevelHandler {
    async fn handle(&self, _args: (), ctx: Context) -> Result<TaskValue, BoxError> {
        let root = self.tree.record(self.tree.root())?;
        ctx.launch_typed::<Traverse>(&root)?.wait().await?;
        Ok(None)
    }
}

pub struct TraverseHandler {
    tree: Arc<Tree>,
    mode: TraversalMode,
}

impl TraverseHandler {
    pub fn new(tree: Arc<Tree>, mode: TraversalMode) -> Self {
        Self { tree, mode }
    }

    async fn settle(&self, future: TaskFuture) -> Result<(), TaskError> {
        match self.mode {
            TraversalMode::FireAndForget => Ok(()),
            TraversalMode::AwaitChildren => future.wait().await.map(drop),
        }
    }
}

#[async_trait]
impl Handler<Traverse> for TraverseHandler {
    async fn handle(&self, node: NodeRecord, ctx: Context) -> Result<TaskValue, BoxError> {
        let print = ctx.launch_typed::<PrintKey>(&node.key)?;
        self.settle(print).await?;

        for child in [node.left, node.right].into_iter().flatten() {
            let record = self.tree.record(child)?;
            let traverse = ctx.launch_typed::<Traverse>(&record)?;
            self.settle(traverse).await?;
        }
        Ok(None)
    }
}

pub struct PrintKeyHandler {
    output: Arc<dyn KeyOutput>,
}

impl PrintKeyHandler {
    pub fn new(output: Arc<dyn KeyOutput>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl Handler<PrintKey> for PrintKeyHandler {
    async fn handle(&self, key: u8, _ctx: Context) -> Result<TaskValue, BoxError> {
        self.output.emit(key)?;
        Ok(None)
    }
}

/// Register the three traversal kinds over `tree`.
pub fn register(
    builder: ExecutorBuilder,
    tree: Arc<Tree>,
    output: Arc<dyn KeyOutput>,
    mode: TraversalMode,
) -> Result<ExecutorBuilder, TaskError> {
    let builder = builder
        .register_typed::<TopLevel, _>(TopLevelHandler::new(Arc::clone(&tree)))?
        .register_typed::<Traverse, _>(TraverseHandler::new(tree, mode))?
        .register_typed::<PrintKey, _>(PrintKeyHandler::new(output))?
        .expect_kinds(&[TOP_LEVEL, TRAVERSE, PRINT_KEY]);
    Ok(builder)
}

/// Descriptor of the top-level task.
pub fn top_level() -> TaskDescriptor {
    TaskLauncher::typed::<TopLevel>(&()).build()
}
