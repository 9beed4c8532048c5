mod compute;
mod exchange;
mod join;
mod network;
mod stream;
mod transfer;

pub use crate::task::{
    compute::ComputeTask,
    exchange::{ExchangeBuffer, ExchangeState, ExchangeTask},
    join::JoinTask,
    network::{ReceiveTask, SendTask},
    transfer::{CopyDirection, TransferTask},
};
use crate::{
    config::Config,
    event::{EventHandle, TaskKind},
    executor::Scheduler,
    types::TaskId,
};
use core::fmt::Debug;

/// A single unit of asynchronous work.
///
/// Tasks are owned by the [`Scheduler`] from `submit` until they report
/// completion. Each tick the scheduler calls `advance` once; the task checks
/// its dependencies and the operations it started, moves its own state
/// machine forward and returns immediately.
pub trait Task<C: Config>: Debug {
    /// What this task does.
    fn kind(&self) -> TaskKind;

    /// Called once by `submit`, before the first `advance`, with the id
    /// assigned to the task and the default dependency in effect.
    fn setup(&mut self, setup: &TaskSetup) {
        let _ = setup;
    }

    /// Make progress without blocking. Returns `true` once the task has
    /// finished; after that every further call returns `true` and does
    /// nothing.
    ///
    /// The task may submit new tasks and look up others through `scheduler`.
    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool;

    /// Human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// Allow a task created inert to start checking for completion.
    fn arm(&mut self) {}
}

/// What a task learns when it is submitted.
#[derive(Debug, Copy, Clone)]
pub struct TaskSetup {
    pub(crate) id: TaskId,
    pub(crate) default_dependency: EventHandle,
}

impl TaskSetup {
    /// Id assigned to the task.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// The transaction's current default dependency.
    #[must_use]
    pub const fn default_dependency(&self) -> EventHandle {
        self.default_dependency
    }
}

/// Events a task waits on before starting its own work.
///
/// An implicit set waits on the default dependency handed over at submit
/// time; an explicit set waits on exactly the listed handles and ignores the
/// default, which is how fan-in is expressed.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    pending: Vec<EventHandle>,
    explicit: bool,
}

impl Dependencies {
    /// Wait on whatever default dependency is in effect at submit time.
    #[must_use]
    pub fn implicit() -> Self {
        Self::default()
    }

    /// Wait on exactly `handles`.
    #[must_use]
    pub fn on(handles: impl IntoIterator<Item = EventHandle>) -> Self {
        Self {
            pending: handles.into_iter().filter(|h| !h.is_null()).collect(),
            explicit: true,
        }
    }

    /// Wait on nothing, not even the default dependency.
    #[must_use]
    pub fn none() -> Self {
        Self::on([])
    }

    /// Whether the set ignores the default dependency.
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Events not yet observed as satisfied.
    #[must_use]
    pub fn pending(&self) -> &[EventHandle] {
        &self.pending
    }

    /// Resolve the implicit default. Explicit sets are left untouched.
    pub fn bind(&mut self, setup: &TaskSetup) {
        if !self.explicit && !setup.default_dependency.is_null() {
            self.pending.push(setup.default_dependency);
        }
    }

    /// Drop every event that has finished and report whether none is left.
    pub fn is_satisfied<C: Config>(&mut self, scheduler: &Scheduler<C>) -> bool {
        self.pending.retain(|handle| !scheduler.is_finished(*handle));
        self.pending.is_empty()
    }
}
