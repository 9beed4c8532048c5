use crate::{
    queue::{DeviceError, DeviceOp, ExecQueue, QueueError},
    sync::{Arc, AtomicU64, Condvar, Mutex, Ordering, thread},
    types::Ticket,
};
use derive_more::Debug;
use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::PoisonError,
};

/// Execution queue backed by a dedicated worker thread.
///
/// The worker runs operations one at a time in enqueue order and publishes
/// progress through an atomic "last retired ticket" counter: a Release store
/// after each operation, an Acquire load in [`ExecQueue::poll`], so a poller
/// that sees a ticket retired also sees everything the operation wrote.
///
/// Dropping the queue waits for already enqueued operations to finish.
#[derive(Debug)]
pub struct HostQueue {
    index: usize,
    shared: Arc<Shared>,
    #[debug(skip)]
    worker: Option<thread::JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    #[debug(skip)]
    state: Mutex<State>,
    #[debug(skip)]
    ready: Condvar,
    retired: AtomicU64,
}

struct State {
    pending: VecDeque<(Ticket, DeviceOp)>,
    issued: Ticket,
    failure: Option<(Ticket, DeviceError)>,
    shutdown: bool,
}

impl HostQueue {
    /// Spawn the worker for the queue at position `index` of its pool.
    #[must_use]
    pub fn spawn(index: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: VecDeque::new(),
                issued: 0,
                failure: None,
                shutdown: false,
            }),
            ready: Condvar::new(),
            retired: AtomicU64::new(0),
        });
        let worker = {
            let shared = shared.clone();
            thread::spawn(move || run_worker(index, &shared))
        };
        Self {
            index,
            shared,
            worker: Some(worker),
        }
    }

    /// Ticket of the last retired operation.
    #[must_use]
    pub fn retired(&self) -> Ticket {
        self.shared.retired.load(Ordering::Acquire)
    }
}

fn run_worker(index: usize, shared: &Shared) {
    loop {
        let (ticket, op) = {
            let mut state = shared.state.lock().expect("HostQueue::run_worker: [1]");
            loop {
                if let Some(next) = state.pending.pop_front() {
                    break next;
                }
                if state.shutdown {
                    return;
                }
                state = shared.ready.wait(state).expect("HostQueue::run_worker: [2]");
            }
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(op))
            .unwrap_or_else(|_| Err(DeviceError::new("operation panicked")));
        if let Err(err) = outcome {
            tracing::error!(queue = index, ticket, error = %err, "device operation failed");
            let mut state = shared.state.lock().expect("HostQueue::run_worker: [3]");
            state.failure.get_or_insert((ticket, err));
        }
        // Publishes the operation's side effects to pollers.
        shared.retired.store(ticket, Ordering::Release);
    }
}

impl ExecQueue for HostQueue {
    fn enqueue(&self, op: DeviceOp) -> Ticket {
        let ticket = {
            let mut state = self.shared.state.lock().expect("HostQueue::enqueue: [1]");
            state.issued += 1;
            let ticket = state.issued;
            state.pending.push_back((ticket, op));
            ticket
        };
        self.shared.ready.notify_one();
        ticket
    }

    fn poll(&self, ticket: Ticket) -> Result<bool, QueueError> {
        if self.shared.retired.load(Ordering::Acquire) < ticket {
            let state = self.shared.state.lock().expect("HostQueue::poll: [1]");
            if ticket > state.issued {
                return Err(QueueError::UnknownTicket {
                    queue: self.index,
                    ticket,
                });
            }
            return Ok(false);
        }
        let state = self.shared.state.lock().expect("HostQueue::poll: [2]");
        match &state.failure {
            Some((failed, err)) if *failed <= ticket => Err(QueueError::Failed {
                queue: self.index,
                ticket: *failed,
                source: err.clone(),
            }),
            _ => Ok(true),
        }
    }
}

impl Drop for HostQueue {
    fn drop(&mut self) {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown = true;
        self.shared.ready.notify_all();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!(queue = self.index, "worker thread panicked");
        }
    }
}
