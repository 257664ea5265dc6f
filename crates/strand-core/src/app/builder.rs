//! ExecutorBuilder - executor の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - registry は start() で freeze され、以後は読み取り専用

use std::sync::Arc;

use super::executor::Executor;
use crate::config::{ConfigError, ExecutorConfig};
use crate::domain::{KindConstraints, ProcessorConstraint, ProcessorKind, TaskKindId};
use crate::error::TaskError;
use crate::ports::{EventSink, NoopEventSink};
use crate::registry::{RegistryBuilder, TaskHandler};
use crate::typed::{Handler, Task, TypedHandler};

/// ExecutorBuilder は registry と設定を集めて Executor を起動する
///
/// # 使用例
/// ```ignore
/// let executor = ExecutorBuilder::new()
///     .config(ExecutorConfig::sequential())
///     .register_typed::<PrintKey, _>(PrintKeyHandler::new(output))?
///     .expect_kinds(&[PrintKey::KIND])
///     .start()?;
/// ```
///
/// # Fail-fast 設計
/// - config の検証
/// - expect_kinds() の集合 ⊆ 登録済み集合
/// - 各 kind の processor 制約を worker の processor が満たすこと
pub struct ExecutorBuilder {
    registry: RegistryBuilder,
    config: ExecutorConfig,
    sink: Arc<dyn EventSink>,
    expected_kinds: Option<Vec<TaskKindId>>,
}

/// BuildError は executor 起動時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task kinds: {0:?}. These kinds were expected but not registered.")]
    MissingTaskKinds(Vec<TaskKindId>),

    #[error("task kind {kind} requires {required:?} but workers run on {available}")]
    UnsupportedProcessor {
        kind: TaskKindId,
        required: ProcessorConstraint,
        available: ProcessorKind,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self {
            registry: RegistryBuilder::new(),
            config: ExecutorConfig::default(),
            sink: Arc::new(NoopEventSink),
            expected_kinds: None,
        }
    }

    /// Register a raw handler.
    pub fn register(
        mut self,
        kind: TaskKindId,
        name: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
        constraints: KindConstraints,
    ) -> Result<Self, TaskError> {
        self.registry.register(kind, name, handler, constraints)?;
        Ok(self)
    }

    /// Register a typed handler; kind, name and constraints come from `T`.
    pub fn register_typed<T: Task, H: Handler<T> + 'static>(
        self,
        handler: H,
    ) -> Result<Self, TaskError> {
        self.register(
            T::KIND,
            T::NAME,
            Arc::new(TypedHandler::<T, H>::new(handler)),
            T::constraints(),
        )
    }

    /// Kinds that must be registered before `start` succeeds.
    pub fn expect_kinds(mut self, kinds: &[TaskKindId]) -> Self {
        self.expected_kinds = Some(kinds.to_vec());
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Freeze the registry and start the executor.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start(self) -> Result<Executor, BuildError> {
        self.config.validate()?;
        let registry = self.registry.freeze();

        if let Some(expected) = &self.expected_kinds {
            let mut missing: Vec<TaskKindId> = expected
                .iter()
                .filter(|kind| !registry.contains(**kind))
                .copied()
                .collect();
            if !missing.is_empty() {
                missing.sort();
                missing.dedup();
                return Err(BuildError::MissingTaskKinds(missing));
            }
        }

        let available = self.config.processor;
        let mut entries: Vec<_> = registry.entries().collect();
        entries.sort_by_key(|entry| entry.kind());
        for entry in entries {
            let required = entry.constraints().processor;
            if !required.admits(available) {
                return Err(BuildError::UnsupportedProcessor {
                    kind: entry.kind(),
                    required,
                    available,
                });
            }
        }

        Ok(Executor::start(registry, &self.config, self.sink))
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
