//! Handler trait - 型付き task を実行する Handler の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - Type erasure パターン (TypedHandler<T, H> → dyn TaskHandler)

use std::marker::PhantomData;

use async_trait::async_trait;

use super::codec::ArgLayout;
use super::task::Task;
use crate::context::Context;
use crate::error::BoxError;
use crate::future::TaskValue;
use crate::registry::TaskHandler;

/// Handler は decode 済みの引数で task を実行する
///
/// # ジェネリクスによる型安全性
/// - `Handler<PrintKey>` は `PrintKey::Args` しか受け取れない
/// - バイト列の decode は TypedHandler が一箇所で行う
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, args: T::Args, ctx: Context) -> Result<TaskValue, BoxError>;
}

/// Adapts a `Handler<T>` to the object-safe `TaskHandler`.
pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> TaskHandler for TypedHandler<T, H> {
    async fn execute(&self, args: &[u8], ctx: Context) -> Result<TaskValue, BoxError> {
        let args = T::Args::decode(args)?;
        self.handler.handle(args, ctx).await
    }
}
