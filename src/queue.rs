mod host;
mod manual;

pub use crate::queue::{host::HostQueue, manual::ManualQueue};
use crate::types::Ticket;
use derive_more::{Deref, Display};
use thiserror::Error;

/// A unit of work executed by an execution queue.
pub type DeviceOp = Box<dyn FnOnce() -> Result<(), DeviceError> + Send + 'static>;

/// Failure reported by a device operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("device operation failed: {0}")]
pub struct DeviceError(pub String);

impl DeviceError {
    /// Wrap a diagnostic message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Error surfaced when polling an execution queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueueError {
    /// An operation at or before the polled ticket failed.
    #[error("operation #{ticket} on queue {queue} failed")]
    Failed {
        /// Index of the queue.
        queue: usize,
        /// Ticket of the failed operation.
        ticket: Ticket,
        /// What the operation reported.
        #[source]
        source: DeviceError,
    },
    /// The ticket was never handed out by this queue.
    #[error("ticket #{ticket} was never issued by queue {queue}")]
    UnknownTicket {
        /// Index of the queue.
        queue: usize,
        /// The polled ticket.
        ticket: Ticket,
    },
}

/// An ordered execution queue.
///
/// Operations retire in the order they were enqueued; different queues run
/// independently of each other. Neither method blocks.
pub trait ExecQueue: core::fmt::Debug {
    /// Append `op` and return its ticket.
    fn enqueue(&self, op: DeviceOp) -> Ticket;

    /// Whether every operation up to and including `ticket` has retired.
    ///
    /// # Errors
    /// If one of those operations failed, or the ticket is unknown.
    fn poll(&self, ticket: Ticket) -> Result<bool, QueueError>;
}

/// Index of a queue inside a [`QueuePool`].
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("queue#{_0}")]
pub struct QueueId(usize);

impl QueueId {
    /// Id of the queue at `index`.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the pool.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Fixed set of execution queues.
///
/// Tasks reference queues by [`QueueId`]; the pool keeps ownership.
#[must_use]
#[derive(Debug, Deref)]
pub struct QueuePool<Q> {
    #[deref]
    queues: Vec<Q>,
    cursor: usize,
}

impl<Q: ExecQueue> QueuePool<Q> {
    /// Build a pool of `len` queues, creating each with `make(index)`.
    ///
    /// # Panics
    /// If `len` is zero.
    pub fn new(len: usize, make: impl FnMut(usize) -> Q) -> Self {
        assert_ne!(len, 0, "QueuePool::new: a pool needs at least one queue");
        Self {
            queues: (0..len).map(make).collect(),
            cursor: 0,
        }
    }

    /// Next queue in round-robin order.
    pub fn next(&mut self) -> QueueId {
        let id = QueueId(self.cursor);
        self.cursor = (self.cursor + 1) % self.queues.len();
        id
    }

    /// The queue behind `id`.
    ///
    /// # Panics
    /// If `id` doesn't belong to this pool.
    #[must_use]
    pub fn get(&self, id: QueueId) -> &Q {
        self.queues
            .get(id.0)
            .unwrap_or_else(|| panic!("QueuePool::get: {id} out of {} queues", self.queues.len()))
    }

    /// Ids of every queue in the pool.
    pub fn ids(&self) -> impl Iterator<Item = QueueId> + use<Q> {
        (0..self.queues.len()).map(QueueId)
    }
}
