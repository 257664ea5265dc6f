//! MemoryEventSink - イベントをメモリに記録する EventSink
//!
//! テストと CLI の `--events` 出力で使う。

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{EventRecord, ExecutorEvent};
use crate::ports::EventSink;

#[derive(Debug, Default)]
pub struct MemoryEventSink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<EventRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.guard().clone()
    }

    pub fn events(&self) -> Vec<ExecutorEvent> {
        self.guard().iter().map(|r| r.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Write every record as one JSON object per line.
    pub fn write_json_lines<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for record in self.guard().iter() {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &ExecutorEvent) {
        self.guard().push(EventRecord::now(event.clone()));
    }
}
