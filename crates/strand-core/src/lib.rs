//! strand-core
//!
//! Task-execution substrate: task kinds, launch, futures and reentrant launch
//! from running tasks.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, kind, descriptor, state, events）
//! - **registry**: task kind -> handler の表（起動前に freeze）
//! - **future / context / launcher**: launch API と結果待ち
//! - **queue**: ready queue（policy, phase, invocation）
//! - **app**: executor（builder, worker_loop, runtime, status）
//! - **typed**: 型付き Task API（Task trait, Handler trait, ArgLayout）
//! - **ports / impls**: EventSink とその実装
//! - **config / observability**: 設定と tracing
//! - **traversal**: 二分木の走査

pub mod app;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod future;
pub mod impls;
pub mod launcher;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod registry;
pub mod traversal;
pub mod typed;

pub use crate::app::{
    BuildError, Executor, ExecutorBuilder, ExecutorHandle, ExecutorStatus, RunReport,
    run_top_level,
};
pub use crate::config::{ConfigError, ExecutorConfig};
pub use crate::context::Context;
pub use crate::domain::{InvocationId, KindConstraints, TaskDescriptor, TaskKindId};
pub use crate::error::{BoxError, TaskError};
pub use crate::future::{TaskFuture, TaskValue};
pub use crate::launcher::{Launch, TaskLauncher};
pub use crate::registry::TaskHandler;
