mod loopback;

pub use crate::transport::loopback::LoopbackTransport;
use crate::mask::Direction;
use derive_more::Display;
use thiserror::Error;

/// Message tag separating concurrent exchanges over the same link.
pub type Tag = u32;

/// Handle of one in-flight non-blocking send or receive.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[display("request#{_0}")]
pub struct RequestId(pub u64);

/// Outcome of testing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Still in flight; test again later.
    Pending,
    /// A send whose buffer may be reused.
    Sent,
    /// A receive, with the delivered payload.
    Received(Vec<u8>),
}

/// Failure reported by the network layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommError {
    /// The request was never issued or already completed.
    #[error("unknown or already completed {0}")]
    UnknownRequest(RequestId),
    /// The neighbor link is not part of the communicator.
    #[error("no neighbor in direction {0}")]
    NoNeighbor(Direction),
    /// Anything the underlying library reports.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Non-blocking point-to-point messaging with face neighbors.
///
/// Calls only start or test operations; none of them waits for the network.
pub trait Transport: core::fmt::Debug {
    /// Start sending `payload` to the neighbor in direction `to`.
    ///
    /// # Errors
    /// If the transfer can't be started.
    fn isend(&mut self, to: Direction, tag: Tag, payload: Vec<u8>) -> Result<RequestId, CommError>;

    /// Start receiving a message from the neighbor in direction `from`.
    ///
    /// # Errors
    /// If the transfer can't be started.
    fn irecv(&mut self, from: Direction, tag: Tag) -> Result<RequestId, CommError>;

    /// Check a request without waiting. A request that reports anything but
    /// [`Completion::Pending`] is released and must not be tested again.
    ///
    /// # Errors
    /// If the request is unknown or failed.
    fn test(&mut self, request: RequestId) -> Result<Completion, CommError>;
}
