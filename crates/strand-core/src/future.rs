//! Future - 1 回の invocation の結果を待つためのハンドル
//!
//! `Promise` (書き込み側) と `TaskFuture` (読み取り側) のペア。
//! 状態は `Pending -> Ready | Failed` の一方向のみ。
//!
//! # 学習ポイント
//! - `tokio::sync::watch` は最後の値を保持するので、何度 wait しても同じ結果が返る
//! - `Promise::resolve(self, ..)` が self を消費するので「一度だけ解決」が型で保証される

use tokio::sync::watch;

use crate::app::slot::WorkerSlot;
use crate::domain::{InvocationId, TaskKindId};
use crate::error::TaskError;

/// Value produced by a task; `None` for void tasks.
pub type TaskValue = Option<Vec<u8>>;

/// Result cell state.
#[derive(Debug, Clone)]
pub enum FutureState {
    Pending,
    Ready(TaskValue),
    Failed(TaskError),
}

impl FutureState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FutureState::Pending)
    }

    fn outcome(&self) -> Option<Result<TaskValue, TaskError>> {
        match self {
            FutureState::Pending => None,
            FutureState::Ready(value) => Some(Ok(value.clone())),
            FutureState::Failed(err) => Some(Err(err.clone())),
        }
    }
}

/// Create a connected promise/future pair for one invocation.
pub(crate) fn pair(invocation: InvocationId, kind: TaskKindId) -> (Promise, TaskFuture) {
    let (tx, rx) = watch::channel(FutureState::Pending);
    let promise = Promise { tx };
    let future = TaskFuture {
        invocation,
        kind,
        rx,
    };
    (promise, future)
}

/// Write side of a future. Owned by the queued invocation.
///
/// Dropping it unresolved makes every waiter observe `TaskError::Cancelled`.
#[derive(Debug)]
pub(crate) struct Promise {
    tx: watch::Sender<FutureState>,
}

impl Promise {
    pub(crate) fn resolve(self, outcome: Result<TaskValue, TaskError>) {
        let state = match outcome {
            Ok(value) => FutureState::Ready(value),
            Err(err) => FutureState::Failed(err),
        };
        // No receivers left is fine: nobody is interested in the outcome.
        self.tx.send_replace(state);
    }
}

/// Handle to the eventual outcome of one invocation.
///
/// Cheap to clone; every clone observes the same terminal state.
#[derive(Debug, Clone)]
pub struct TaskFuture {
    invocation: InvocationId,
    kind: TaskKindId,
    rx: watch::Receiver<FutureState>,
}

impl TaskFuture {
    pub fn invocation_id(&self) -> InvocationId {
        self.invocation
    }

    pub fn kind(&self) -> TaskKindId {
        self.kind
    }

    pub fn is_resolved(&self) -> bool {
        !self.rx.borrow().is_pending()
    }

    /// Non-blocking peek at the outcome.
    pub fn try_outcome(&self) -> Option<Result<TaskValue, TaskError>> {
        self.rx.borrow().outcome()
    }

    /// Wait until the invocation reaches a terminal state.
    ///
    /// Returns the stored value, or re-raises the stored error. Idempotent.
    ///
    /// Called from inside a running handler, the handler's worker slot is
    /// handed back while the future is pending and taken again before this
    /// returns, so nested waits cannot exhaust the pool. If the wait is
    /// dropped early the slot is taken back on drop.
    pub async fn wait(&self) -> Result<TaskValue, TaskError> {
        if let Some(outcome) = self.try_outcome() {
            return outcome;
        }

        let suspension = WorkerSlot::current().and_then(|slot| slot.suspend());
        if suspension.is_some() {
            tracing::trace!(invocation = %self.invocation, "slot released while waiting");
        }

        let mut rx = self.rx.clone();
        let outcome = match rx.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.outcome(),
            Err(_) => None,
        };

        if let Some(suspension) = suspension {
            suspension.resume().await;
        }

        outcome.unwrap_or(Err(TaskError::Cancelled {
            invocation: self.invocation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_pair() -> (Promise, TaskFuture) {
        pair(InvocationId::generate(), TaskKindId::new(1))
    }

    #[test]
    fn future_reports_its_invocation_and_kind() {
        let id = InvocationId::generate();
        let (_promise, future) = pair(id, TaskKindId::new(9));
        assert_eq!(future.invocation_id(), id);
        assert_eq!(future.kind(), TaskKindId::new(9));
    }

    #[tokio::test]
    async fn wait_returns_value_and_is_idempotent() {
        let (promise, future) = new_pair();
        assert!(!future.is_resolved());
        assert!(future.try_outcome().is_none());

        promise.resolve(Ok(Some(vec![7, 8])));

        assert!(future.is_resolved());
        assert_eq!(future.wait().await.unwrap(), Some(vec![7, 8]));
        assert_eq!(future.wait().await.unwrap(), Some(vec![7, 8]));
        assert_eq!(future.clone().wait().await.unwrap(), Some(vec![7, 8]));
    }

    #[tokio::test]
    async fn wait_reraises_the_stored_error() {
        let (promise, future) = new_pair();
        promise.resolve(Err(TaskError::ShutdownInProgress));

        for _ in 0..2 {
            let err = future.wait().await.unwrap_err();
            assert!(matches!(err, TaskError::ShutdownInProgress));
        }
    }

    #[tokio::test]
    async fn wait_blocks_until_resolved() {
        let (promise, future) = new_pair();
        let waiter = tokio::spawn({
            let future = future.clone();
            async move { future.wait().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        promise.resolve(Ok(None));
        let outcome = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.unwrap(), None);
    }

    #[tokio::test]
    async fn dropped_promise_cancels_waiters() {
        let (promise, future) = new_pair();
        let id = future.invocation_id();
        drop(promise);

        let err = future.wait().await.unwrap_err();
        assert!(matches!(err, TaskError::Cancelled { invocation } if invocation == id));
    }
}
