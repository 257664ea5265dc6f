use std::sync::Arc;

use super::TaskKindId;

/// Immutable description of one launch: kind id + an owned copy of the
/// argument bytes.
///
/// The bytes are copied out of the caller's buffer on construction, so the
/// caller may reuse or drop its buffer as soon as the descriptor exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    kind: TaskKindId,
    args: Arc<[u8]>,
    expects_result: bool,
}

impl TaskDescriptor {
    pub fn new(kind: TaskKindId, args: &[u8], expects_result: bool) -> Self {
        Self {
            kind,
            args: Arc::from(args),
            expects_result,
        }
    }

    pub fn kind(&self) -> TaskKindId {
        self.kind
    }

    pub fn args(&self) -> &[u8] {
        &self.args
    }

    pub(crate) fn shared_args(&self) -> Arc<[u8]> {
        Arc::clone(&self.args)
    }

    /// When false the future resolves with no value even if the handler
    /// returned one.
    pub fn expects_result(&self) -> bool {
        self.expects_result
    }
}
