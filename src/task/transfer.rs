use crate::{
    config::Config,
    event::TaskKind,
    executor::Scheduler,
    queue::{DeviceError, QueueId},
    task::{Dependencies, Task, TaskSetup, stream::StreamOp},
};
use derive_more::Display;

/// Which memories a copy moves data between.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CopyDirection {
    /// Host memory into device memory.
    #[display("host->device")]
    HostToDevice,
    /// Device memory back to the host.
    #[display("device->host")]
    DeviceToHost,
    /// Between two device buffers.
    #[display("device->device")]
    DeviceToDevice,
}

impl CopyDirection {
    const fn kind(self) -> TaskKind {
        match self {
            Self::HostToDevice => TaskKind::CopyHostToDevice,
            Self::DeviceToHost => TaskKind::CopyDeviceToHost,
            Self::DeviceToDevice => TaskKind::CopyDeviceToDevice,
        }
    }
}

/// A memory copy on an execution queue. Finishes when the queue retires it.
#[derive(Debug)]
pub struct TransferTask {
    direction: CopyDirection,
    bytes: usize,
    op: StreamOp,
}

impl TransferTask {
    /// Copy of `bytes` bytes performed by `copy` on `queue`.
    pub fn new(
        direction: CopyDirection,
        bytes: usize,
        queue: QueueId,
        copy: impl FnOnce() -> Result<(), DeviceError> + Send + 'static,
    ) -> Self {
        Self {
            direction,
            bytes,
            op: StreamOp::new(queue, Box::new(copy)),
        }
    }

    /// Replace the dependency set.
    #[must_use]
    pub fn depends_on(mut self, dependencies: Dependencies) -> Self {
        self.op.dependencies = dependencies;
        self
    }

    /// Copy direction.
    #[must_use]
    pub const fn direction(&self) -> CopyDirection {
        self.direction
    }
}

impl<C: Config> Task<C> for TransferTask {
    fn kind(&self) -> TaskKind {
        self.direction.kind()
    }

    fn setup(&mut self, setup: &TaskSetup) {
        self.op.dependencies.bind(setup);
    }

    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool {
        self.op.progress(scheduler, "TransferTask")
    }

    fn describe(&self) -> String {
        format!(
            "copy {} of {} bytes on {}",
            self.direction,
            self.bytes,
            self.op.queue()
        )
    }
}
