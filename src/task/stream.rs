use crate::{
    config::Config,
    executor::Scheduler,
    queue::{DeviceOp, ExecQueue, QueueId},
    task::Dependencies,
    types::Ticket,
    utils::fatal,
};
use core::mem;
use derive_more::Debug;

/// An operation bound to one execution queue: issued once its dependencies
/// are gone, finished once the queue retires it.
#[derive(Debug)]
pub(super) struct StreamOp {
    queue: QueueId,
    pub(super) dependencies: Dependencies,
    stage: Stage,
}

#[derive(Debug)]
enum Stage {
    Waiting(#[debug(skip)] DeviceOp),
    Issued(Ticket),
    Retired,
}

impl StreamOp {
    pub(super) fn new(queue: QueueId, op: DeviceOp) -> Self {
        Self {
            queue,
            dependencies: Dependencies::implicit(),
            stage: Stage::Waiting(op),
        }
    }

    pub(super) fn queue(&self) -> QueueId {
        self.queue
    }

    pub(super) fn ticket(&self) -> Option<Ticket> {
        match self.stage {
            Stage::Issued(ticket) => Some(ticket),
            Stage::Waiting(_) | Stage::Retired => None,
        }
    }

    pub(super) fn is_retired(&self) -> bool {
        matches!(self.stage, Stage::Retired)
    }

    /// Returns `true` once the queue has retired the operation.
    pub(super) fn progress<C: Config>(&mut self, scheduler: &Scheduler<C>, origin: &str) -> bool {
        loop {
            match self.stage {
                Stage::Retired => return true,
                Stage::Waiting(_) => {
                    if !self.dependencies.is_satisfied(scheduler) {
                        return false;
                    }
                    let Stage::Waiting(op) = mem::replace(&mut self.stage, Stage::Retired) else {
                        unreachable!("StreamOp::progress: [1]");
                    };
                    let ticket = scheduler.queues().get(self.queue).enqueue(op);
                    tracing::trace!(origin, queue = %self.queue, ticket, "issued");
                    self.stage = Stage::Issued(ticket);
                }
                Stage::Issued(ticket) => match scheduler.queues().get(self.queue).poll(ticket) {
                    Ok(true) => self.stage = Stage::Retired,
                    Ok(false) => return false,
                    Err(err) => fatal(origin, err),
                },
            }
        }
    }
}
