//! Executor configuration.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high -> low):
//! 1. CLI arguments (applied by the binary)
//! 2. Environment variables (STRAND_*)
//! 3. JSON config file
//! 4. Default values
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProcessorKind;
use crate::queue::QueuePolicy;

pub const ENV_WORKER_SLOTS: &str = "STRAND_WORKER_SLOTS";
pub const ENV_WORKER_THREADS: &str = "STRAND_WORKER_THREADS";
pub const ENV_QUEUE_POLICY: &str = "STRAND_QUEUE_POLICY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("worker_slots must be at least 1")]
    NoWorkerSlots,

    #[error("worker_threads must be at least 1 when set")]
    NoWorkerThreads,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Number of invocations allowed to run at the same time.
    pub worker_slots: usize,

    /// OS threads backing the async runtime; `None` uses the runtime default.
    pub worker_threads: Option<usize>,

    pub queue_policy: QueuePolicy,

    /// Processor kind the worker slots run on.
    pub processor: ProcessorKind,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let worker_slots = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            worker_slots,
            worker_threads: None,
            queue_policy: QueuePolicy::Fifo,
            processor: ProcessorKind::LatencyOptimized,
        }
    }
}

impl ExecutorConfig {
    /// Single worker slot, FIFO: execution order equals launch order.
    pub fn sequential() -> Self {
        Self {
            worker_slots: 1,
            ..Self::default()
        }
    }

    pub fn with_worker_slots(mut self, worker_slots: usize) -> Self {
        self.worker_slots = worker_slots;
        self
    }

    pub fn with_queue_policy(mut self, queue_policy: QueuePolicy) -> Self {
        self.queue_policy = queue_policy;
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Apply `STRAND_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|var| std::env::var(var).ok())
    }

    /// Apply `STRAND_*` overrides using `lookup` as the environment.
    pub fn with_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_WORKER_SLOTS) {
            self.worker_slots = parse_env(ENV_WORKER_SLOTS, value)?;
        }
        if let Some(value) = lookup(ENV_WORKER_THREADS) {
            self.worker_threads = Some(parse_env(ENV_WORKER_THREADS, value)?);
        }
        if let Some(value) = lookup(ENV_QUEUE_POLICY) {
            self.queue_policy = parse_env(ENV_QUEUE_POLICY, value)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_slots == 0 {
            return Err(ConfigError::NoWorkerSlots);
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::NoWorkerThreads);
        }
        Ok(())
    }
}

fn parse_env<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::InvalidEnv {
        var,
        reason: e.to_string(),
        value,
    })
}
