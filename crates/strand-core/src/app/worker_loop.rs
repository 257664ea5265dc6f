//! WorkerLoop - invocation 実行ループ
//!
//! # フロー
//! 1. ReadyQueue::pop() で invocation を取得
//! 2. worker slot (semaphore permit) を取得し、ReadyQueue::start() (Queued -> Running)
//! 3. handler を専用の task で実行 (slot は task-local に置く)
//! 4. 結果で future を解決し、ReadyQueue::finish() で記録
//!
//! pop してから slot を取るので、キューが空のときに slot を握ったまま待つことはない。

use std::any::Any;
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use super::executor::Shared;
use super::slot::WorkerSlot;
use crate::context::Context;
use crate::domain::{ExecutorEvent, InvocationId, InvocationState, TaskDescriptor};
use crate::error::{HandlerPanic, TaskError};
use crate::future::TaskValue;
use crate::queue::Invocation;
use crate::registry::TaskHandler;

/// Dispatch invocations until the queue is closed and drained, then wait for
/// the handlers still running.
pub(crate) async fn worker_loop(shared: Arc<Shared>) {
    let mut running = JoinSet::new();

    loop {
        // Kept alive across select iterations: dropping it could lose a
        // dequeued invocation.
        let next = next_invocation(&shared);
        tokio::pin!(next);

        let item = loop {
            tokio::select! {
                biased;
                Some(joined) = running.join_next(), if !running.is_empty() => reap(joined),
                item = &mut next => break item,
            }
        };

        let Some((invocation, permit)) = item else {
            break;
        };
        running.spawn(run_invocation(Arc::clone(&shared), invocation, permit));
    }

    while let Some(joined) = running.join_next().await {
        reap(joined);
    }
    tracing::debug!("worker loop stopped");
}

async fn next_invocation(shared: &Shared) -> Option<(Invocation, OwnedSemaphorePermit)> {
    loop {
        let mut invocation = shared.queue.pop().await?;
        let permit = shared.slots.acquire().await?;
        if shared.queue.start(&mut invocation) {
            return Some((invocation, permit));
        }
        // Closed while this one was waiting for a slot.
        shared.cancel(invocation);
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "invocation task aborted");
    }
}

async fn run_invocation(shared: Arc<Shared>, invocation: Invocation, permit: OwnedSemaphorePermit) {
    let Invocation {
        id,
        descriptor,
        promise,
        parent,
        enqueued_at,
        ..
    } = invocation;
    let kind = descriptor.kind();
    tracing::debug!(
        invocation = %id,
        %kind,
        queued_us = enqueued_at.elapsed().as_micros() as u64,
        "dequeued"
    );

    // Launch already checked the kind; a miss here is a registry mismatch.
    let outcome = match shared.registry.lookup(kind) {
        Ok(entry) => {
            let handler = Arc::clone(entry.handler());
            let leaf = entry.is_leaf();
            execute(&shared, id, parent, &descriptor, handler, leaf, permit).await
        }
        Err(err) => {
            drop(permit);
            Err(err)
        }
    };

    let terminal = match &outcome {
        Ok(_) => {
            tracing::debug!(invocation = %id, %kind, "completed");
            shared.events.emit(ExecutorEvent::Completed {
                invocation: id,
                kind,
            });
            InvocationState::Completed
        }
        Err(err) => {
            // Nobody may ever wait on this future; make sure the failure is seen.
            tracing::warn!(invocation = %id, %kind, error = %err, "task failed");
            shared.events.emit(ExecutorEvent::Failed {
                invocation: id,
                kind,
                error: err.to_string(),
            });
            InvocationState::Failed
        }
    };

    promise.resolve(outcome);
    shared.queue.finish(terminal);
}

/// Run the handler on its own task with `permit` as its worker slot.
async fn execute(
    shared: &Arc<Shared>,
    id: InvocationId,
    parent: Option<InvocationId>,
    descriptor: &TaskDescriptor,
    handler: Arc<dyn TaskHandler>,
    leaf: bool,
    permit: OwnedSemaphorePermit,
) -> Result<TaskValue, TaskError> {
    let kind = descriptor.kind();
    shared.events.emit(ExecutorEvent::Started {
        invocation: id,
        kind,
    });

    let slot = WorkerSlot::new(Arc::clone(&shared.slots), permit);
    let ctx = Context::new(Arc::clone(shared), id, kind, leaf);
    let args = descriptor.shared_args();
    let span = tracing::debug_span!("invocation", id = %id, kind = %kind, parent = ?parent);
    let task = WorkerSlot::scope(Arc::clone(&slot), async move {
        handler.execute(&args, ctx).await
    })
    .instrument(span);

    // Own task so a panicking handler is caught here instead of killing the loop.
    let joined = tokio::spawn(task).await;
    slot.release();

    match joined {
        Ok(Ok(value)) if descriptor.expects_result() => Ok(value),
        Ok(Ok(_)) => Ok(None),
        Ok(Err(source)) => Err(TaskError::handler_failure(kind, source)),
        Err(join_err) => Err(TaskError::handler_failure(
            kind,
            Box::new(HandlerPanic(panic_message(join_err))),
        )),
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
