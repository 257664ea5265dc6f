//! Typed - 型付き Task API
//!
//! # 二層構造
//! - **表層（Typed）**: `Task` trait, `Handler<T>` trait, `ArgLayout` - 型安全
//! - **内部（Dyn）**: `TaskHandler` trait - object-safe, バイト列のまま

pub mod codec;
pub mod handler;
pub mod task;

pub use self::codec::{ArgLayout, ArgumentLayoutError};
pub use self::handler::{Handler, TypedHandler};
pub use self::task::Task;
