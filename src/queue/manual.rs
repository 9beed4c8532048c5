use crate::{
    queue::{DeviceError, DeviceOp, ExecQueue, QueueError},
    types::Ticket,
};
use core::cell::{Cell, RefCell};
use derive_more::Debug;
use std::collections::VecDeque;

/// Execution queue whose operations only run when the owner says so.
///
/// Nothing executes in the background: [`ManualQueue::retire_next`] runs the
/// oldest pending operation on the calling thread. This makes the point at
/// which work completes fully deterministic, which is what tests and
/// dry-runs of a schedule want.
#[derive(Debug, Default)]
pub struct ManualQueue {
    index: usize,
    #[debug(skip)]
    pending: RefCell<VecDeque<(Ticket, DeviceOp)>>,
    issued: Cell<Ticket>,
    retired: Cell<Ticket>,
    failure: RefCell<Option<(Ticket, DeviceError)>>,
}

impl ManualQueue {
    /// Empty queue at position `index` of its pool.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Run the oldest pending operation. Returns `false` if there was none.
    pub fn retire_next(&self) -> bool {
        let Some((ticket, op)) = self.pending.borrow_mut().pop_front() else {
            return false;
        };
        if let Err(err) = op() {
            self.failure.borrow_mut().get_or_insert((ticket, err));
        }
        self.retired.set(ticket);
        true
    }

    /// Run every pending operation, returning how many ran.
    pub fn retire_all(&self) -> usize {
        let mut count = 0;
        while self.retire_next() {
            count += 1;
        }
        count
    }

    /// Number of operations enqueued but not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Ticket of the last retired operation.
    #[must_use]
    pub fn retired(&self) -> Ticket {
        self.retired.get()
    }
}

impl ExecQueue for ManualQueue {
    fn enqueue(&self, op: DeviceOp) -> Ticket {
        let ticket = self.issued.get() + 1;
        self.issued.set(ticket);
        self.pending.borrow_mut().push_back((ticket, op));
        ticket
    }

    fn poll(&self, ticket: Ticket) -> Result<bool, QueueError> {
        if ticket > self.issued.get() {
            return Err(QueueError::UnknownTicket {
                queue: self.index,
                ticket,
            });
        }
        if let Some((failed, err)) = &*self.failure.borrow() {
            if *failed <= ticket {
                return Err(QueueError::Failed {
                    queue: self.index,
                    ticket: *failed,
                    source: err.clone(),
                });
            }
        }
        Ok(self.retired.get() >= ticket)
    }
}
