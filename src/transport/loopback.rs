use crate::{
    mask::{Dim, Direction},
    transport::{CommError, Completion, RequestId, Tag, Transport},
    types::HashMap,
};
use std::collections::VecDeque;

/// In-process transport for a single rank with periodic boundaries.
///
/// Every neighbor is the rank itself: a message sent toward `d` comes back
/// as a message from `d.opposite()`. A send becomes visible to receivers
/// only after it has been tested `latency` times, which keeps transfers
/// observably asynchronous.
#[derive(Debug)]
pub struct LoopbackTransport {
    dim: Dim,
    latency: u32,
    next_request: u64,
    requests: HashMap<RequestId, Request>,
    mailboxes: HashMap<(Direction, Tag), VecDeque<Vec<u8>>>,
}

#[derive(Debug)]
enum Request {
    Send {
        arrives_from: Direction,
        tag: Tag,
        payload: Vec<u8>,
        polls_left: u32,
    },
    Receive {
        from: Direction,
        tag: Tag,
    },
}

impl LoopbackTransport {
    /// Transport for a domain of dimensionality `dim` whose sends complete
    /// on their first test.
    #[must_use]
    pub fn new(dim: Dim) -> Self {
        Self::with_latency(dim, 0)
    }

    /// Transport whose sends stay pending for `latency` tests.
    #[must_use]
    pub fn with_latency(dim: Dim, latency: u32) -> Self {
        Self {
            dim,
            latency,
            next_request: 0,
            requests: HashMap::default(),
            mailboxes: HashMap::default(),
        }
    }

    /// Number of requests started but not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.requests.len()
    }

    fn check_neighbor(&self, direction: Direction) -> Result<(), CommError> {
        if direction.min_dim() as u8 > self.dim as u8 {
            return Err(CommError::NoNeighbor(direction));
        }
        Ok(())
    }

    fn register(&mut self, request: Request) -> RequestId {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        self.requests.insert(id, request);
        id
    }
}

impl Transport for LoopbackTransport {
    fn isend(&mut self, to: Direction, tag: Tag, payload: Vec<u8>) -> Result<RequestId, CommError> {
        self.check_neighbor(to)?;
        Ok(self.register(Request::Send {
            arrives_from: to.opposite(),
            tag,
            payload,
            polls_left: self.latency,
        }))
    }

    fn irecv(&mut self, from: Direction, tag: Tag) -> Result<RequestId, CommError> {
        self.check_neighbor(from)?;
        Ok(self.register(Request::Receive { from, tag }))
    }

    fn test(&mut self, request: RequestId) -> Result<Completion, CommError> {
        let Some(state) = self.requests.get_mut(&request) else {
            return Err(CommError::UnknownRequest(request));
        };
        match state {
            Request::Send { polls_left, .. } if *polls_left > 0 => {
                *polls_left -= 1;
                Ok(Completion::Pending)
            }
            Request::Send { .. } => {
                let Some(Request::Send {
                    arrives_from,
                    tag,
                    payload,
                    ..
                }) = self.requests.remove(&request)
                else {
                    unreachable!("LoopbackTransport::test: [1]");
                };
                self.mailboxes
                    .entry((arrives_from, tag))
                    .or_default()
                    .push_back(payload);
                Ok(Completion::Sent)
            }
            Request::Receive { from, tag } => {
                let key = (*from, *tag);
                let Some(payload) = self.mailboxes.get_mut(&key).and_then(VecDeque::pop_front)
                else {
                    return Ok(Completion::Pending);
                };
                self.requests.remove(&request);
                Ok(Completion::Received(payload))
            }
        }
    }
}
