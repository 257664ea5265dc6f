//! Impls - ports の実装

pub mod memory_sink;

pub use self::memory_sink::MemoryEventSink;
