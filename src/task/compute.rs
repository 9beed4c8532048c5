use crate::{
    config::Config,
    event::TaskKind,
    executor::Scheduler,
    queue::{DeviceError, QueueId},
    task::{Dependencies, Task, TaskSetup, stream::StreamOp},
};

/// A kernel launch on an execution queue.
///
/// The launch is enqueued once the task's dependencies are satisfied and
/// the task finishes when the queue retires it. A task built with
/// [`ComputeTask::deferred`] stays inert, returning `false` from every
/// `advance`, until [`Scheduler::arm`] is called on its handle.
#[derive(Debug)]
pub struct ComputeTask {
    name: String,
    op: StreamOp,
    armed: bool,
}

impl ComputeTask {
    /// Kernel `name` running `launch` on `queue`, checked from the first tick.
    pub fn new(
        name: impl Into<String>,
        queue: QueueId,
        launch: impl FnOnce() -> Result<(), DeviceError> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            op: StreamOp::new(queue, Box::new(launch)),
            armed: true,
        }
    }

    /// Like [`ComputeTask::new`], but inert until armed.
    pub fn deferred(
        name: impl Into<String>,
        queue: QueueId,
        launch: impl FnOnce() -> Result<(), DeviceError> + Send + 'static,
    ) -> Self {
        Self {
            armed: false,
            ..Self::new(name, queue, launch)
        }
    }

    /// Replace the dependency set.
    #[must_use]
    pub fn depends_on(mut self, dependencies: Dependencies) -> Self {
        self.op.dependencies = dependencies;
        self
    }

    /// Kernel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether completion checks are enabled.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }
}

impl<C: Config> Task<C> for ComputeTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Kernel
    }

    fn setup(&mut self, setup: &TaskSetup) {
        self.op.dependencies.bind(setup);
    }

    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool {
        if !self.armed {
            return false;
        }
        self.op.progress(scheduler, &self.name)
    }

    fn describe(&self) -> String {
        let stage = match self.op.ticket() {
            _ if !self.armed => "unarmed".to_owned(),
            Some(ticket) => format!("ticket {ticket}"),
            None if self.op.is_retired() => "retired".to_owned(),
            None => format!("waiting on {} event(s)", self.op.dependencies.pending().len()),
        };
        format!("kernel {} on {} ({stage})", self.name, self.op.queue())
    }

    fn arm(&mut self) {
        self.armed = true;
    }
}
