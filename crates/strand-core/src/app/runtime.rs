//! Runtime - top-level task を 1 つ実行して drain するまで
//!
//! ```text
//! start -> launch(top-level) -> wait -> shutdown (drain) -> RunReport
//! ```

use super::builder::{BuildError, ExecutorBuilder};
use super::status::ExecutorStatus;
use crate::domain::TaskDescriptor;
use crate::error::TaskError;
use crate::future::TaskValue;

/// Outcome of `run_top_level`.
#[derive(Debug)]
pub struct RunReport {
    /// Result of the top-level invocation itself.
    pub outcome: Result<TaskValue, TaskError>,
    /// Executor status after every launched invocation finished.
    pub status: ExecutorStatus,
}

impl RunReport {
    /// The top-level task succeeded and nothing it launched failed.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok() && self.status.counts.failed == 0
    }
}

/// Start the executor, run `top_level`, and shut down gracefully once every
/// task it transitively launched has finished.
pub async fn run_top_level(
    builder: ExecutorBuilder,
    top_level: TaskDescriptor,
) -> Result<RunReport, BuildError> {
    let executor = builder.start()?;

    let outcome = match executor.launch(top_level) {
        Ok(future) => future.wait().await,
        Err(err) => Err(err),
    };
    if let Err(err) = &outcome {
        tracing::warn!(error = %err, "top-level task failed");
    }

    let status = executor.shutdown().await;
    Ok(RunReport { outcome, status })
}
