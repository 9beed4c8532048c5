mod notify;
mod registry;

use crate::{
    config::{Config, Settings},
    event::{EventHandle, TaskKind},
    executor::{notify::Observers, registry::Registry},
    queue::QueuePool,
    task::{JoinTask, Task, TaskSetup},
    transaction::{Transaction, Transactions},
    types::TaskId,
};
use core::{fmt, mem, time::Duration};
use std::{thread, time::Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Error returned by [`Scheduler::drain_all_within`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DrainError {
    /// Tasks were still live when the deadline passed.
    #[error("{} task(s) still pending after {elapsed:?}: {}", .pending.len(), .pending.join("; "))]
    Timeout {
        /// Time spent draining.
        elapsed: Duration,
        /// Descriptions of the tasks still live, in creation order.
        pending: Vec<String>,
    },
}

/// Owner of every live task and driver of the non-blocking poll loop.
///
/// Responsibilities:
/// - Registers submitted tasks under fresh ids, in creation order.
/// - Answers "is this event satisfied?": an event is satisfied exactly when
///   no live task carries its id.
/// - Polls every live task once per [`Scheduler::tick`]; tasks that report
///   completion are unregistered on the spot and their observers notified.
/// - Owns the execution queue pool, the network transport and the
///   transaction stack that tasks use while being polled.
///
/// Everything runs on the controlling thread. The background work happens
/// in the queues and the network layer, never in the scheduler itself.
#[must_use]
pub struct Scheduler<C: Config> {
    registry: Registry<C>,
    observers: Observers,
    queues: QueuePool<C::Queue>,
    transport: C::Transport,
    transactions: Transactions,
    settings: Settings,
    last_id: u64,
    polling: Option<TaskId>,
    ticks: u64,
}

/// Non-owning view of a live task.
#[derive(Debug)]
pub struct TaskRef<'a, C: Config> {
    id: TaskId,
    kind: TaskKind,
    task: Option<&'a dyn Task<C>>,
}

impl<'a, C: Config> TaskRef<'a, C> {
    /// Id of the task.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Kind of the task.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Handle referring to the task.
    #[must_use]
    pub const fn handle(&self) -> EventHandle {
        EventHandle::new(self.id, self.kind)
    }

    /// The task itself; `None` while it is inside its own poll.
    #[must_use]
    pub fn task(&self) -> Option<&'a dyn Task<C>> {
        self.task
    }

    /// Diagnostic description of the task.
    #[must_use]
    pub fn describe(&self) -> String {
        self.task.map_or_else(
            || format!("#{} {} (being polled)", self.id, self.kind),
            |task| task.describe(),
        )
    }
}

impl<C: Config> Scheduler<C> {
    /// Scheduler driving `queues` and `transport`.
    pub fn new(settings: Settings, queues: QueuePool<C::Queue>, transport: C::Transport) -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::default(),
            queues,
            transport,
            transactions: Transactions::default(),
            settings,
            last_id: 0,
            polling: None,
            ticks: 0,
        }
    }

    /// Register `task` and return its handle. Never blocks; the task is
    /// first polled on the next tick (or later in the current one when
    /// submitted from inside a poll).
    pub fn submit(&mut self, task: impl Task<C> + 'static) -> EventHandle {
        self.submit_boxed(Box::new(task))
    }

    /// [`Scheduler::submit`] for an already boxed task.
    ///
    /// # Panics
    /// If the task id space is exhausted.
    pub fn submit_boxed(&mut self, mut task: Box<dyn Task<C>>) -> EventHandle {
        self.last_id = self
            .last_id
            .checked_add(1)
            .expect("Scheduler::submit: task ids exhausted");
        let id = TaskId::new(self.last_id).expect("Scheduler::submit: [1]");
        task.setup(&TaskSetup {
            id,
            default_dependency: self.transactions.current_default(),
        });
        let kind = task.kind();
        debug!(task = %id, %kind, description = %task.describe(), "submitted");
        self.registry.insert(id, kind, task);
        let handle = EventHandle::new(id, kind);
        self.transactions.record(handle);
        handle
    }

    /// The live task with `id`, or `None` once it has finished.
    ///
    /// Absence is the definition of completion: once this returns `None` for
    /// an id it does so forever.
    #[must_use]
    pub fn lookup(&self, id: TaskId) -> Option<TaskRef<'_, C>> {
        self.registry.get(id).map(|slot| TaskRef {
            id,
            kind: slot.kind,
            task: slot.task.as_deref(),
        })
    }

    /// The live task `event` refers to; `None` for satisfied events.
    #[must_use]
    pub fn lookup_event(&self, event: EventHandle) -> Option<TaskRef<'_, C>> {
        event.task_id().and_then(|id| self.lookup(id))
    }

    /// Whether `event` is satisfied.
    #[must_use]
    pub fn is_finished(&self, event: EventHandle) -> bool {
        self.lookup_event(event).is_none()
    }

    /// Poll every live task once, in creation order, and return how many
    /// finished.
    ///
    /// Tasks submitted during the pass are polled in the same pass. A task
    /// that finishes is removed right away, so tasks polled after it already
    /// see its events satisfied.
    ///
    /// Each task is polled outside of any transaction, even when the tick
    /// runs through an open [`Transaction`] guard.
    ///
    /// # Panics
    /// If called from inside a task's poll, or if a task returns from
    /// `advance` with a transaction still open.
    pub fn tick(&mut self) -> usize {
        if let Some(id) = self.polling {
            panic!("Scheduler::tick: called from inside the poll of task #{id}");
        }
        self.ticks += 1;
        let mut finished = 0;
        let mut index = 0;
        while let Some((id, mut task)) = self.registry.take(index) {
            // Polls see a fresh stack: tasks spawned from inside `advance`
            // neither chain on nor record into the caller's transactions.
            let outer = mem::take(&mut self.transactions);
            self.polling = Some(id);
            let done = task.advance(self);
            self.polling = None;
            assert_eq!(
                self.transactions.depth(),
                0,
                "Scheduler::tick: task #{id} left a transaction open"
            );
            self.transactions = outer;
            if !done {
                self.registry.restore(index, task);
                index += 1;
                continue;
            }
            let (removed, kind) = self.registry.remove(index);
            assert_eq!(removed, id, "Scheduler::tick: [1]");
            debug!(task = %id, %kind, description = %task.describe(), "finished");
            drop(task);
            self.observers.publish(EventHandle::new(id, kind));
            finished += 1;
        }
        trace!(tick = self.ticks, finished, live = self.registry.len(), "tick");
        finished
    }

    /// Tick until no task is live.
    ///
    /// A task that never completes makes this spin forever; a warning naming
    /// the pending tasks is logged once no task has finished for
    /// [`Settings::stall_warning`].
    pub fn drain_all(&mut self) {
        let mut last_progress = Instant::now();
        let mut warned = false;
        while !self.registry.is_empty() {
            if self.tick() > 0 {
                last_progress = Instant::now();
                warned = false;
                continue;
            }
            if !warned && last_progress.elapsed() >= self.settings.stall_warning {
                warn!(
                    stalled_for = ?last_progress.elapsed(),
                    pending = ?self.describe_pending(),
                    "drain made no progress"
                );
                warned = true;
            }
            self.idle();
        }
    }

    /// Tick until no task is live or `timeout` has passed.
    ///
    /// # Errors
    /// If tasks are still live at the deadline. They stay registered and
    /// can be drained further.
    pub fn drain_all_within(&mut self, timeout: Duration) -> Result<(), DrainError> {
        let start = Instant::now();
        while !self.registry.is_empty() {
            if self.tick() > 0 {
                continue;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(DrainError::Timeout {
                    elapsed,
                    pending: self.describe_pending(),
                });
            }
            self.idle();
        }
        Ok(())
    }

    /// Tick until `event` is satisfied. For synchronization points only:
    /// it keeps the controlling thread busy for as long as that takes.
    pub fn wait(&mut self, event: EventHandle) {
        while !self.is_finished(event) {
            if self.tick() == 0 {
                self.idle();
            }
        }
    }

    /// Event satisfied once all of `events` are.
    ///
    /// Already satisfied events are dropped; no task is created for zero or
    /// one remaining event.
    pub fn join(&mut self, events: impl IntoIterator<Item = EventHandle>) -> EventHandle {
        let pending: Vec<_> = events
            .into_iter()
            .filter(|event| !self.is_finished(*event))
            .collect();
        match pending.as_slice() {
            [] => EventHandle::NULL,
            [single] => *single,
            _ => self.submit(JoinTask::new(pending)),
        }
    }

    /// Enable completion checks of an inert task. Returns whether a live
    /// task was armed.
    pub fn arm(&mut self, event: EventHandle) -> bool {
        let Some(slot) = event.task_id().and_then(|id| self.registry.get_mut(id)) else {
            return false;
        };
        let Some(task) = slot.task.as_mut() else {
            return false;
        };
        task.arm();
        true
    }

    /// Run `callback` once `event` is satisfied: in the tick that finishes
    /// its task, or right now if it already is.
    pub fn on_finished(&mut self, event: EventHandle, callback: impl FnOnce(EventHandle) + 'static) {
        match event.task_id() {
            Some(id) if !self.is_finished(event) => self.observers.watch(id, Box::new(callback)),
            _ => callback(event),
        }
    }

    /// Run `listener` for every task that finishes from now on.
    pub fn add_listener(&mut self, listener: impl FnMut(EventHandle) + 'static) {
        self.observers.listen(Box::new(listener));
    }

    /// Open a transaction whose tasks start after `base`.
    pub fn begin_transaction(&mut self, base: EventHandle) -> Transaction<'_, C> {
        Transaction::open(self, base)
    }

    /// The transaction stack.
    #[must_use]
    pub fn transactions(&self) -> &Transactions {
        &self.transactions
    }

    /// The transaction stack, for manual push/pop.
    pub fn transactions_mut(&mut self) -> &mut Transactions {
        &mut self.transactions
    }

    /// The execution queue pool.
    #[must_use]
    pub fn queues(&self) -> &QueuePool<C::Queue> {
        &self.queues
    }

    /// The execution queue pool, for round-robin selection.
    pub fn queues_mut(&mut self) -> &mut QueuePool<C::Queue> {
        &mut self.queues
    }

    /// The network transport.
    #[must_use]
    pub fn transport(&self) -> &C::Transport {
        &self.transport
    }

    /// The network transport.
    pub fn transport_mut(&mut self) -> &mut C::Transport {
        &mut self.transport
    }

    /// Runtime settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no task is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Live tasks in creation order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskRef<'_, C>> {
        self.registry.iter().map(|(id, slot)| TaskRef {
            id,
            kind: slot.kind,
            task: slot.task.as_deref(),
        })
    }

    fn describe_pending(&self) -> Vec<String> {
        self.registry
            .iter()
            .map(|(id, slot)| format!("#{id} {}", slot.describe()))
            .collect()
    }

    fn idle(&self) {
        if self.settings.yield_when_idle {
            thread::yield_now();
        }
    }
}

impl<C: Config> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.registry)
            .field("observers", &self.observers)
            .field("queues", &self.queues)
            .field("transport", &self.transport)
            .field("transactions", &self.transactions)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}
