//! App - アプリケーション層
//!
//! registry・ready queue・worker slot を組み合わせて executor を実装します。
//!
//! # 主要コンポーネント
//! - **ExecutorBuilder**: 登録・設定・起動時検証
//! - **Executor**: launch と shutdown
//! - **WorkerLoop**: invocation 実行ループ（pop→slot→handle→resolve→finish）
//! - **Outbox**: イベントをロックの外で EventSink に配送
//! - **Runtime**: top-level task を 1 つ実行して drain する

pub mod builder;
pub(crate) mod executor;
pub(crate) mod outbox;
pub mod runtime;
pub(crate) mod slot;
pub mod status;
mod worker_loop;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ExecutorBuilder};
pub use self::executor::{Executor, ExecutorHandle};
pub use self::runtime::{RunReport, run_top_level};
pub use self::status::ExecutorStatus;
