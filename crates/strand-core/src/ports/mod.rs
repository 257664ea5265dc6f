//! Ports - 抽象化レイヤー
//!
//! executor が外部に依存する境界を trait として定義する。

pub mod event_sink;

pub use self::event_sink::{EventSink, NoopEventSink};
