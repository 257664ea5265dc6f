//! Task kinds and the metadata attached to them at registration time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier selecting which registered handler executes for a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKindId(u32);

impl TaskKindId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Class of processor a worker pool runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    /// General purpose, latency-optimized cores.
    #[default]
    LatencyOptimized,
    /// Utility cores reserved for runtime bookkeeping.
    Utility,
    /// Cores dedicated to blocking IO.
    Io,
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessorKind::LatencyOptimized => "latency_optimized",
            ProcessorKind::Utility => "utility",
            ProcessorKind::Io => "io",
        };
        f.write_str(s)
    }
}

impl FromStr for ProcessorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latency_optimized" | "loc" | "cpu" => Ok(ProcessorKind::LatencyOptimized),
            "utility" | "util" => Ok(ProcessorKind::Utility),
            "io" => Ok(ProcessorKind::Io),
            other => Err(format!("unknown processor kind: {other}")),
        }
    }
}

/// Where a task kind is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorConstraint {
    #[default]
    Any,
    Only(ProcessorKind),
}

impl ProcessorConstraint {
    pub fn admits(self, processor: ProcessorKind) -> bool {
        match self {
            ProcessorConstraint::Any => true,
            ProcessorConstraint::Only(required) => required == processor,
        }
    }
}

/// Metadata contracted for a task kind. Never changes after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindConstraints {
    /// Exact length every launch payload must have.
    pub arg_size: usize,
    /// Leaf kinds perform no further launches.
    pub leaf: bool,
    pub processor: ProcessorConstraint,
}

impl KindConstraints {
    pub fn new(arg_size: usize) -> Self {
        Self {
            arg_size,
            leaf: false,
            processor: ProcessorConstraint::Any,
        }
    }

    pub fn leaf(mut self) -> Self {
        self.leaf = true;
        self
    }

    pub fn processor(mut self, processor: ProcessorConstraint) -> Self {
        self.processor = processor;
        self
    }
}
