//! Task registry: task kind -> handler + constraints.
//!
//! Design:
//! - Built during initialization (`RegistryBuilder`, mutable).
//! - `freeze()` moves it into a `TaskRegistry` that is read-only for the rest
//!   of the process, so lookups never take a lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::domain::{KindConstraints, TaskKindId};
use crate::error::{BoxError, TaskError};
use crate::future::TaskValue;

/// A handler for a specific task kind.
///
/// Receives the raw argument bytes (already checked against the contracted
/// size) and a fresh `Context` bound to the invocation.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn execute(&self, args: &[u8], ctx: Context) -> Result<TaskValue, BoxError>;
}

/// One registered task kind. Write-once.
#[derive(Clone)]
pub struct RegistryEntry {
    kind: TaskKindId,
    name: String,
    handler: Arc<dyn TaskHandler>,
    constraints: KindConstraints,
}

impl RegistryEntry {
    pub fn kind(&self) -> TaskKindId {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Arc<dyn TaskHandler> {
        &self.handler
    }

    pub fn constraints(&self) -> KindConstraints {
        self.constraints
    }

    pub fn is_leaf(&self) -> bool {
        self.constraints.leaf
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

/// Mutable registry used before the executor starts.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<TaskKindId, RegistryEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a handler for a task kind.
    ///
    /// A second registration for the same kind is rejected and the first one
    /// stays in place.
    pub fn register(
        &mut self,
        kind: TaskKindId,
        name: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
        constraints: KindConstraints,
    ) -> Result<(), TaskError> {
        if self.entries.contains_key(&kind) {
            return Err(TaskError::DuplicateTaskKind(kind));
        }
        let entry = RegistryEntry {
            kind,
            name: name.into(),
            handler,
            constraints,
        };
        self.entries.insert(kind, entry);
        Ok(())
    }

    pub fn contains(&self, kind: TaskKindId) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the registration phase.
    pub fn freeze(self) -> TaskRegistry {
        TaskRegistry {
            entries: self.entries,
        }
    }
}

/// Frozen registry shared by the executor and every context.
#[derive(Debug)]
pub struct TaskRegistry {
    entries: HashMap<TaskKindId, RegistryEntry>,
}

impl TaskRegistry {
    pub fn lookup(&self, kind: TaskKindId) -> Result<&RegistryEntry, TaskError> {
        self.entries
            .get(&kind)
            .ok_or(TaskError::UnknownTaskKind(kind))
    }

    pub fn contains(&self, kind: TaskKindId) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Registered kinds in ascending order.
    pub fn kinds(&self) -> Vec<TaskKindId> {
        let mut kinds: Vec<TaskKindId> = self.entries.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProcessorConstraint, ProcessorKind};

    struct OkHandler;

    #[async_trait]
    impl TaskHandler for OkHandler {
        async fn execute(&self, _args: &[u8], _ctx: Context) -> Result<TaskValue, BoxError> {
            Ok(None)
        }
    }

    const KIND: TaskKindId = TaskKindId::new(1);

    #[test]
    fn lookup_returns_what_was_registered() {
        let handler: Arc<dyn TaskHandler> = Arc::new(OkHandler);
        let constraints = KindConstraints::new(9)
            .processor(ProcessorConstraint::Only(ProcessorKind::LatencyOptimized));

        let mut builder = RegistryBuilder::new();
        builder
            .register(KIND, "traverse", Arc::clone(&handler), constraints)
            .unwrap();
        let registry = builder.freeze();

        let entry = registry.lookup(KIND).unwrap();
        assert!(Arc::ptr_eq(entry.handler(), &handler));
        assert_eq!(entry.constraints(), constraints);
        assert_eq!(entry.name(), "traverse");
        assert!(!entry.is_leaf());
    }

    #[test]
    fn duplicate_registration_keeps_the_first() {
        let first: Arc<dyn TaskHandler> = Arc::new(OkHandler);
        let mut builder = RegistryBuilder::new();
        builder
            .register(KIND, "first", Arc::clone(&first), KindConstraints::new(1))
            .unwrap();

        let err = builder
            .register(KIND, "second", Arc::new(OkHandler), KindConstraints::new(4).leaf())
            .unwrap_err();
        assert!(matches!(err, TaskError::DuplicateTaskKind(k) if k == KIND));

        let registry = builder.freeze();
        let entry = registry.lookup(KIND).unwrap();
        assert_eq!(entry.name(), "first");
        assert_eq!(entry.constraints(), KindConstraints::new(1));
        assert!(Arc::ptr_eq(entry.handler(), &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_of_unregistered_kind_fails() {
        let registry = RegistryBuilder::new().freeze();
        let err = registry.lookup(TaskKindId::new(42)).unwrap_err();
        assert!(matches!(err, TaskError::UnknownTaskKind(k) if k == TaskKindId::new(42)));
        assert!(registry.is_empty());
    }

    #[test]
    fn kinds_are_sorted() {
        let mut builder = RegistryBuilder::new();
        for id in [3, 1, 2] {
            builder
                .register(
                    TaskKindId::new(id),
                    format!("k{id}"),
                    Arc::new(OkHandler),
                    KindConstraints::new(0),
                )
                .unwrap();
        }
        let registry = builder.freeze();
        assert_eq!(
            registry.kinds(),
            vec![TaskKindId::new(1), TaskKindId::new(2), TaskKindId::new(3)]
        );
    }
}
