//! Dequeue policy: which ready invocation a worker takes next.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Oldest first. With a single worker slot this reproduces launch order.
    #[default]
    Fifo,
    /// Newest first.
    Lifo,
    /// Uniformly random pick; useful to shake out ordering assumptions.
    Random,
}

impl QueuePolicy {
    pub(crate) fn take<T>(self, ready: &mut VecDeque<T>) -> Option<T> {
        match self {
            QueuePolicy::Fifo => ready.pop_front(),
            QueuePolicy::Lifo => ready.pop_back(),
            QueuePolicy::Random => {
                if ready.is_empty() {
                    return None;
                }
                let idx = rand::thread_rng().gen_range(0..ready.len());
                ready.remove(idx)
            }
        }
    }
}

impl fmt::Display for QueuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueuePolicy::Fifo => "fifo",
            QueuePolicy::Lifo => "lifo",
            QueuePolicy::Random => "random",
        };
        f.write_str(s)
    }
}

impl FromStr for QueuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(QueuePolicy::Fifo),
            "lifo" => Ok(QueuePolicy::Lifo),
            "random" => Ok(QueuePolicy::Random),
            other => Err(format!("unknown queue policy: {other}")),
        }
    }
}
