//! Executor - task kind registry + ready queue + worker slots
//!
//! # ライフサイクル
//! ```text
//! ExecutorBuilder::start()
//!   -> Accepting  (launch OK)
//!   -> Draining   (shutdown(): task からの launch のみ OK)
//!   -> Closed     (全ての launch を ShutdownInProgress で拒否)
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::outbox::EventOutbox;
use super::slot::SlotPool;
use super::status::ExecutorStatus;
use super::worker_loop::worker_loop;
use crate::config::ExecutorConfig;
use crate::domain::{ExecutorEvent, InvocationId, TaskDescriptor};
use crate::error::TaskError;
use crate::future::{self, TaskFuture};
use crate::launcher::{Launch, TaskLauncher};
use crate::ports::EventSink;
use crate::queue::{Invocation, LaunchOrigin, ReadyQueue};
use crate::registry::TaskRegistry;
use crate::typed::Task;

/// State shared by the executor, its handles, the dispatcher and every
/// `Context`.
pub(crate) struct Shared {
    pub(crate) registry: TaskRegistry,
    pub(crate) queue: ReadyQueue,
    pub(crate) slots: Arc<SlotPool>,
    pub(crate) worker_slots: usize,
    pub(crate) events: EventOutbox,
}

impl Shared {
    /// Validate and enqueue one launch. Never waits.
    pub(crate) fn submit(
        &self,
        descriptor: TaskDescriptor,
        origin: LaunchOrigin,
    ) -> Result<TaskFuture, TaskError> {
        let kind = descriptor.kind();
        let entry = self.registry.lookup(kind)?;

        let expected = entry.constraints().arg_size;
        let actual = descriptor.args().len();
        if actual != expected {
            return Err(TaskError::ArgumentSizeMismatch {
                kind,
                expected,
                actual,
            });
        }

        let id = InvocationId::generate();
        let parent = origin.parent();
        let (promise, future) = future::pair(id, kind);
        let invocation = Invocation::new(id, descriptor, promise, parent);

        // Queued under the queue lock so it precedes `Started`; delivered after.
        let seq = self.queue.push_with(invocation, origin, |queued| {
            self.events.enqueue(ExecutorEvent::Launched {
                invocation: id,
                seq: queued.seq,
                kind,
                parent,
                args: queued.descriptor.args().to_vec(),
            });
        })?;
        self.events.publish();
        tracing::trace!(invocation = %id, %kind, seq, "launched");

        Ok(future)
    }

    /// Resolve an invocation that will never run.
    pub(crate) fn cancel(&self, invocation: Invocation) {
        let id = invocation.id;
        let kind = invocation.descriptor.kind();
        tracing::debug!(invocation = %id, %kind, "cancelled");
        self.events.emit(ExecutorEvent::Cancelled {
            invocation: id,
            kind,
        });
        invocation
            .promise
            .resolve(Err(TaskError::Cancelled { invocation: id }));
    }

    fn status(&self) -> ExecutorStatus {
        ExecutorStatus {
            phase: self.queue.phase(),
            worker_slots: self.worker_slots,
            available_slots: self.slots.available(),
            counts: self.queue.counts(),
        }
    }
}

/// Cloneable launch handle, usable after the `Executor` has been moved into a
/// shutdown call.
#[derive(Clone)]
pub struct ExecutorHandle {
    shared: Arc<Shared>,
}

impl ExecutorHandle {
    pub fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError> {
        self.shared.submit(descriptor, LaunchOrigin::External)
    }

    pub fn launch_typed<T: Task>(&self, args: &T::Args) -> Result<TaskFuture, TaskError> {
        TaskLauncher::typed::<T>(args).launch(self)
    }

    pub fn status(&self) -> ExecutorStatus {
        self.shared.status()
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.shared.registry
    }
}

impl Launch for ExecutorHandle {
    fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError> {
        ExecutorHandle::launch(self, descriptor)
    }
}

/// A running executor.
///
/// Created by `ExecutorBuilder::start`. Dropping it without calling a shutdown
/// method cancels whatever is still queued.
pub struct Executor {
    handle: ExecutorHandle,
    dispatcher: Option<JoinHandle<()>>,
}

impl Executor {
    /// Spawn the dispatcher on the current tokio runtime.
    pub(crate) fn start(
        registry: TaskRegistry,
        config: &ExecutorConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let shared = Arc::new(Shared {
            registry,
            queue: ReadyQueue::new(config.queue_policy),
            slots: SlotPool::new(config.worker_slots),
            worker_slots: config.worker_slots,
            events: EventOutbox::new(sink),
        });
        let dispatcher = tokio::spawn(worker_loop(Arc::clone(&shared)));

        tracing::info!(
            worker_slots = config.worker_slots,
            queue_policy = %config.queue_policy,
            processor = %config.processor,
            kinds = shared.registry.len(),
            "executor started"
        );

        Self {
            handle: ExecutorHandle { shared },
            dispatcher: Some(dispatcher),
        }
    }

    pub fn handle(&self) -> ExecutorHandle {
        self.handle.clone()
    }

    pub fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError> {
        self.handle.launch(descriptor)
    }

    pub fn launch_typed<T: Task>(&self, args: &T::Args) -> Result<TaskFuture, TaskError> {
        self.handle.launch_typed::<T>(args)
    }

    pub fn status(&self) -> ExecutorStatus {
        self.handle.status()
    }

    pub fn registry(&self) -> &TaskRegistry {
        self.handle.registry()
    }

    /// Graceful shutdown.
    ///
    /// Rejects new external launches, lets queued and running invocations
    /// finish (including the children they launch meanwhile), then closes.
    pub async fn shutdown(mut self) -> ExecutorStatus {
        tracing::info!("draining");
        self.handle.shared.queue.begin_drain();
        self.handle.shared.queue.wait_idle().await;
        self.close_and_join().await
    }

    /// Immediate shutdown.
    ///
    /// Queued invocations are cancelled; running handlers finish, but their
    /// further launches are rejected.
    pub async fn shutdown_now(mut self) -> ExecutorStatus {
        tracing::info!("shutting down now");
        self.close_and_join().await
    }

    async fn close_and_join(&mut self) -> ExecutorStatus {
        self.cancel_queued();
        if let Some(dispatcher) = self.dispatcher.take()
            && let Err(e) = dispatcher.await
        {
            tracing::error!(error = %e, "dispatcher failed");
        }

        let status = self.status();
        tracing::info!(
            completed = status.counts.completed,
            failed = status.counts.failed,
            cancelled = status.counts.cancelled,
            "executor stopped"
        );
        status
    }

    fn cancel_queued(&self) {
        let shared = &self.handle.shared;
        for invocation in shared.queue.close() {
            shared.cancel(invocation);
        }
    }
}

impl Launch for Executor {
    fn launch(&self, descriptor: TaskDescriptor) -> Result<TaskFuture, TaskError> {
        self.handle.launch(descriptor)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if self.dispatcher.is_some() {
            self.cancel_queued();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ExecutorBuilder;
    use crate::app::slot::WorkerSlot;
    use crate::context::Context;
    use crate::domain::{KindConstraints, TaskKindId};
    use crate::error::BoxError;
    use crate::future::TaskValue;
    use crate::impls::MemoryEventSink;
    use crate::queue::Phase;
    use crate::registry::{RegistryBuilder, TaskHandler};
    use crate::typed::{ArgLayout, Handler};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use tokio::sync::Notify;

    const ECHO: TaskKindId = TaskKindId::new(1);
    const FAIL: TaskKindId = TaskKindId::new(2);
    const PANIC: TaskKindId = TaskKindId::new(3);
    const GATE: TaskKindId = TaskKindId::new(4);
    const IMPATIENT: TaskKindId = TaskKindId::new(5);

    struct EchoHandler;

    #[async_trait]
    impl TaskHandler for EchoHandler {
        async fn execute(&self, args: &[u8], _ctx: Context) -> Result<TaskValue, BoxError> {
            Ok(Some(args.to_vec()))
        }
    }

    struct FailHandler;

    #[async_trait]
    impl TaskHandler for FailHandler {
        async fn execute(&self, _args: &[u8], _ctx: Context) -> Result<TaskValue, BoxError> {
            Err("boom".into())
        }
    }

    struct PanicHandler;

    #[async_trait]
    impl TaskHandler for PanicHandler {
        async fn execute(&self, _args: &[u8], _ctx: Context) -> Result<TaskValue, BoxError> {
            panic!("kaboom");
        }
    }

    /// Runs until `release` is notified.
    struct GateHandler {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl TaskHandler for GateHandler {
        async fn execute(&self, _args: &[u8], _ctx: Context) -> Result<TaskValue, BoxError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(None)
        }
    }

    /// Gives up waiting on a gate child, then reports whether it still holds
    /// a slot and whether a later echo child was kept from running beside it.
    struct ImpatientHandler {
        release_gate: Arc<Notify>,
    }

    #[async_trait]
    impl TaskHandler for ImpatientHandler {
        async fn execute(&self, _args: &[u8], ctx: Context) -> Result<TaskValue, BoxError> {
            let gate = ctx.launch(TaskDescriptor::new(GATE, &[], false))?;
            let timed_out = tokio::time::timeout(Duration::from_millis(50), gate.wait())
                .await
                .is_err();
            let held = WorkerSlot::current().is_some_and(|slot| slot.is_held());

            let echo = ctx.launch(TaskDescriptor::new(ECHO, &[7], false))?;
            self.release_gate.notify_one();
            tokio::time::sleep(Duration::from_millis(50)).await;
            let echo_held_back = !echo.is_resolved();

            Ok(Some(vec![
                u8::from(timed_out),
                u8::from(held),
                u8::from(echo_held_back),
            ]))
        }
    }

    /// Reads the status on every event and launches an echo child from the
    /// `Launched` event of `ECHO [1]`.
    #[derive(Default)]
    struct ReentrantSink {
        handle: OnceLock<ExecutorHandle>,
        children: Mutex<Vec<TaskFuture>>,
        seen: AtomicUsize,
    }

    impl EventSink for ReentrantSink {
        fn emit(&self, event: &ExecutorEvent) {
            let Some(handle) = self.handle.get() else {
                return;
            };
            assert_ne!(handle.status().worker_slots, 0);
            self.seen.fetch_add(1, Ordering::SeqCst);
            if let ExecutorEvent::Launched { kind, args, .. } = event
                && *kind == ECHO
                && *args == [1]
            {
                let child = handle
                    .launch(TaskDescriptor::new(ECHO, &[2], true))
                    .unwrap();
                self.children.lock().unwrap().push(child);
            }
        }
    }

    /// Launches itself with `n - 1` and waits for the child.
    struct Countdown;

    impl Task for Countdown {
        const KIND: TaskKindId = TaskKindId::new(10);
        const NAME: &'static str = "countdown";
        const RETURNS_VALUE: bool = true;
        type Args = u32;
    }

    struct CountdownHandler;

    #[async_trait]
    impl Handler<Countdown> for CountdownHandler {
        async fn handle(&self, n: u32, ctx: Context) -> Result<TaskValue, BoxError> {
            if n > 0 {
                let child = ctx.launch_typed::<Countdown>(&(n - 1))?;
                let value = child.wait().await?.ok_or("child returned nothing")?;
                let below = u32::decode(&value)?;
                return Ok(Some((below + n).encode()));
            }
            Ok(Some(0u32.encode()))
        }
    }

    /// Launches `n` echo children and returns without waiting for them.
    struct Spawner;

    impl Task for Spawner {
        const KIND: TaskKindId = TaskKindId::new(11);
        const NAME: &'static str = "spawner";
        type Args = u8;
    }

    struct SpawnerHandler;

    #[async_trait]
    impl Handler<Spawner> for SpawnerHandler {
        async fn handle(&self, n: u8, ctx: Context) -> Result<TaskValue, BoxError> {
            for i in 0..n {
                TaskLauncher::new(ECHO, &[i]).launch(&ctx)?;
            }
            Ok(None)
        }
    }

    /// Leaf kind that tries to launch anyway and reports what happened.
    struct Leafy;

    impl Task for Leafy {
        const KIND: TaskKindId = TaskKindId::new(12);
        const NAME: &'static str = "leafy";
        const LEAF: bool = true;
        const RETURNS_VALUE: bool = true;
        type Args = ();
    }

    struct LeafyHandler;

    #[async_trait]
    impl Handler<Leafy> for LeafyHandler {
        async fn handle(&self, _args: (), ctx: Context) -> Result<TaskValue, BoxError> {
            let rejected = matches!(
                ctx.launch(TaskDescriptor::new(ECHO, &[1], false)),
                Err(TaskError::LeafTaskLaunch(k)) if k == Leafy::KIND
            );
            Ok(Some(vec![u8::from(rejected)]))
        }
    }

    fn builder(slots: usize) -> ExecutorBuilder {
        ExecutorBuilder::new()
            .config(ExecutorConfig::sequential().with_worker_slots(slots))
            .register(ECHO, "echo", Arc::new(EchoHandler), KindConstraints::new(1))
            .unwrap()
            .register(FAIL, "fail", Arc::new(FailHandler), KindConstraints::new(0))
            .unwrap()
            .register(PANIC, "panic", Arc::new(PanicHandler), KindConstraints::new(0))
            .unwrap()
            .register_typed::<Countdown, _>(CountdownHandler)
            .unwrap()
            .register_typed::<Spawner, _>(SpawnerHandler)
            .unwrap()
            .register_typed::<Leafy, _>(LeafyHandler)
            .unwrap()
    }

    async fn within<F: std::future::Future>(fut: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(5), fut)
            .await
            .expect("timed out")
    }

    #[tokio::test]
    async fn launch_validates_kind_and_argument_size() {
        let executor = builder(2).start().unwrap();

        let err = executor
            .launch(TaskDescriptor::new(TaskKindId::new(99), &[], false))
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownTaskKind(k) if k == TaskKindId::new(99)));

        let err = executor
            .launch(TaskDescriptor::new(ECHO, &[1, 2, 3], false))
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::ArgumentSizeMismatch { expected: 1, actual: 3, .. }
        ));

        assert!(executor.registry().contains(ECHO));
        assert_eq!(executor.handle().registry().kinds(), executor.registry().kinds());

        let status = executor.shutdown().await;
        assert_eq!(status.counts.launched, 0);
    }

    #[tokio::test]
    async fn value_is_kept_only_when_requested() {
        let executor = builder(2).start().unwrap();

        let wanted = executor
            .launch(TaskDescriptor::new(ECHO, &[42], true))
            .unwrap();
        let void = executor
            .launch(TaskDescriptor::new(ECHO, &[42], false))
            .unwrap();

        assert_eq!(within(wanted.wait()).await.unwrap(), Some(vec![42]));
        assert_eq!(within(void.wait()).await.unwrap(), None);
        executor.shutdown().await;
    }

    #[tokio::test]
    async fn failures_reach_waiters_and_the_event_sink() {
        let sink = Arc::new(MemoryEventSink::new());
        let executor = builder(2).event_sink(sink.clone()).start().unwrap();

        let failed = executor
            .launch(TaskDescriptor::new(FAIL, &[], false))
            .unwrap();
        let panicked = executor
            .launch(TaskDescriptor::new(PANIC, &[], false))
            .unwrap();

        let err = within(failed.wait()).await.unwrap_err();
        assert!(matches!(err, TaskError::TaskHandlerFailure { kind, .. } if kind == FAIL));
        assert!(err.to_string().contains("boom"));

        let err = within(panicked.wait()).await.unwrap_err();
        assert!(err.to_string().contains("kaboom"));

        let status = executor.shutdown().await;
        assert_eq!(status.counts.failed, 2);

        let failures = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, ExecutorEvent::Failed { .. }))
            .count();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn nested_waits_finish_with_a_single_slot() {
        let executor = builder(1).start().unwrap();

        let future = executor.launch_typed::<Countdown>(&20).unwrap();
        let value = within(future.wait()).await.unwrap().unwrap();
        assert_eq!(u32::decode(&value).unwrap(), (0..=20).sum::<u32>());

        let status = executor.shutdown().await;
        assert_eq!(status.counts.completed, 21);
        assert_eq!(status.available_slots, 1);
    }

    #[tokio::test]
    async fn graceful_shutdown_runs_children_launched_while_draining() {
        let executor = builder(2).start().unwrap();
        executor.launch_typed::<Spawner>(&5).unwrap();

        let status = within(executor.shutdown()).await;
        assert_eq!(status.phase, Phase::Closed);
        assert_eq!(status.counts.completed, 6);
        assert!(status.is_quiescent());
    }

    #[tokio::test]
    async fn launches_after_shutdown_are_rejected() {
        let executor = builder(1).start().unwrap();
        let handle = executor.handle();
        executor.shutdown().await;

        let err = handle
            .launch(TaskDescriptor::new(ECHO, &[1], false))
            .unwrap_err();
        assert!(matches!(err, TaskError::ShutdownInProgress));
        assert_eq!(handle.status().phase, Phase::Closed);
    }

    #[tokio::test]
    async fn shutdown_now_cancels_queued_invocations() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gate = GateHandler {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        };
        let sink = Arc::new(MemoryEventSink::new());
        let executor = builder(1)
            .register(GATE, "gate", Arc::new(gate), KindConstraints::new(0))
            .unwrap()
            .event_sink(sink.clone())
            .start()
            .unwrap();

        let running = executor
            .launch(TaskDescriptor::new(GATE, &[], false))
            .unwrap();
        within(started.notified()).await;
        let queued = executor
            .launch(TaskDescriptor::new(ECHO, &[1], true))
            .unwrap();

        let shutdown = tokio::spawn(executor.shutdown_now());
        tokio::time::sleep(Duration::from_millis(20)).await;
        release.notify_one();
        let status = within(shutdown).await.unwrap();

        assert!(within(running.wait()).await.is_ok());
        let err = within(queued.wait()).await.unwrap_err();
        assert!(matches!(err, TaskError::Cancelled { invocation } if invocation == queued.invocation_id()));

        assert_eq!(status.counts.completed, 1);
        assert_eq!(status.counts.cancelled, 1);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            ExecutorEvent::Cancelled { invocation, .. } if *invocation == queued.invocation_id()
        )));
    }

    #[tokio::test]
    async fn leaf_tasks_cannot_launch() {
        let executor = builder(1).start().unwrap();
        let future = executor.launch_typed::<Leafy>(&()).unwrap();
        assert_eq!(within(future.wait()).await.unwrap(), Some(vec![1]));
        let status = executor.shutdown().await;
        assert_eq!(status.counts.launched, 1);
    }

    #[tokio::test]
    async fn launched_events_record_parent_and_order() {
        let sink = Arc::new(MemoryEventSink::new());
        let executor = builder(1).event_sink(sink.clone()).start().unwrap();
        let parent = executor.launch_typed::<Spawner>(&2).unwrap();
        executor.shutdown().await;

        let launched: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ExecutorEvent::Launched {
                    invocation,
                    seq,
                    parent,
                    args,
                    ..
                } => Some((invocation, seq, parent, args)),
                _ => None,
            })
            .collect();

        assert_eq!(launched.len(), 3);
        assert_eq!(launched[0].0, parent.invocation_id());
        assert_eq!(launched[0].2, None);
        for (i, (_, seq, from, args)) in launched.iter().enumerate().skip(1) {
            assert_eq!(*seq, i as u64);
            assert_eq!(*from, Some(parent.invocation_id()));
            assert_eq!(args, &vec![i as u8 - 1]);
        }

        // Every invocation is announced before it starts.
        let events = sink.events();
        for (idx, event) in events.iter().enumerate() {
            if let ExecutorEvent::Started { invocation, .. } = event {
                assert!(events[..idx].iter().any(|e| matches!(
                    e,
                    ExecutorEvent::Launched { invocation: l, .. } if l == invocation
                )));
            }
        }
    }

    #[tokio::test]
    async fn dropping_the_executor_cancels_queued_work() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gate = GateHandler {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        };
        let executor = builder(1)
            .register(GATE, "gate", Arc::new(gate), KindConstraints::new(0))
            .unwrap()
            .start()
            .unwrap();

        executor
            .launch(TaskDescriptor::new(GATE, &[], false))
            .unwrap();
        within(started.notified()).await;
        let queued = executor
            .launch(TaskDescriptor::new(ECHO, &[1], false))
            .unwrap();

        drop(executor);
        release.notify_one();
        assert!(matches!(
            within(queued.wait()).await,
            Err(TaskError::Cancelled { .. })
        ));
    }

    #[tokio::test]
    async fn timed_out_wait_keeps_the_slot_limit() {
        let release_gate = Arc::new(Notify::new());
        let gate = GateHandler {
            started: Arc::new(Notify::new()),
            release: Arc::clone(&release_gate),
        };
        let impatient = ImpatientHandler { release_gate };
        let executor = builder(1)
            .register(GATE, "gate", Arc::new(gate), KindConstraints::new(0))
            .unwrap()
            .register(IMPATIENT, "impatient", Arc::new(impatient), KindConstraints::new(0))
            .unwrap()
            .start()
            .unwrap();

        let future = executor
            .launch(TaskDescriptor::new(IMPATIENT, &[], true))
            .unwrap();
        assert_eq!(within(future.wait()).await.unwrap(), Some(vec![1, 1, 1]));

        let status = within(executor.shutdown()).await;
        assert_eq!(status.counts.completed, 3);
        assert_eq!(status.available_slots, 1);
    }

    #[tokio::test]
    async fn running_count_stays_within_worker_slots() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gate = GateHandler {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        };
        let executor = builder(1)
            .register(GATE, "gate", Arc::new(gate), KindConstraints::new(0))
            .unwrap()
            .start()
            .unwrap();

        executor
            .launch(TaskDescriptor::new(GATE, &[], false))
            .unwrap();
        within(started.notified()).await;
        for tag in 1..=2 {
            executor
                .launch(TaskDescriptor::new(ECHO, &[tag], false))
                .unwrap();
        }
        // The dispatcher has dequeued one echo and is waiting for the slot.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let status = executor.status();
        assert_eq!(status.counts.running, 1);
        assert_eq!(status.counts.queued, 2);
        assert_eq!(status.available_slots, 0);

        release.notify_one();
        let status = within(executor.shutdown()).await;
        assert_eq!(status.counts.completed, 3);
        assert!(status.is_quiescent());
    }

    #[tokio::test]
    async fn event_sink_may_call_back_into_the_executor() {
        let sink = Arc::new(ReentrantSink::default());
        let executor = builder(2).event_sink(sink.clone()).start().unwrap();
        assert!(sink.handle.set(executor.handle()).is_ok());

        let first = executor
            .launch(TaskDescriptor::new(ECHO, &[1], true))
            .unwrap();
        assert_eq!(within(first.wait()).await.unwrap(), Some(vec![1]));

        let child = sink.children.lock().unwrap().pop().unwrap();
        assert_eq!(within(child.wait()).await.unwrap(), Some(vec![2]));

        let status = within(executor.shutdown()).await;
        assert_eq!(status.counts.completed, 2);
        // Launched, Started and Completed for each.
        assert_eq!(sink.seen.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn unregistered_invocation_fails_through_the_sink() {
        let sink = Arc::new(MemoryEventSink::new());
        let executor = Executor::start(
            RegistryBuilder::new().freeze(),
            &ExecutorConfig::sequential(),
            sink.clone(),
        );

        // Bypasses the launch-time kind check.
        let id = InvocationId::generate();
        let kind = TaskKindId::new(77);
        let (promise, waiter) = future::pair(id, kind);
        let invocation = Invocation::new(id, TaskDescriptor::new(kind, &[], false), promise, None);
        executor
            .handle
            .shared
            .queue
            .push(invocation, LaunchOrigin::External)
            .unwrap();

        let err = within(waiter.wait()).await.unwrap_err();
        assert!(matches!(err, TaskError::UnknownTaskKind(k) if k == kind));

        let status = executor.shutdown().await;
        assert_eq!(status.counts.failed, 1);
        assert_eq!(status.available_slots, 1);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            ExecutorEvent::Failed { invocation, .. } if *invocation == id
        )));
    }
}
