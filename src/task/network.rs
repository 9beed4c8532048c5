use crate::{
    config::Config,
    event::TaskKind,
    executor::Scheduler,
    mask::{Direction, ExchangeMask},
    transport::{Completion, RequestId, Tag, Transport},
    task::{Dependencies, Task, TaskSetup},
    utils::fatal,
};
use derive_more::Debug;

/// Non-blocking sends of one payload per neighbor direction.
///
/// The sends are started together once the dependencies are satisfied; the
/// task finishes when the transport reports every one of them complete.
#[derive(Debug)]
pub struct SendTask {
    tag: Tag,
    #[debug("{} message(s)", messages.len())]
    messages: Vec<(Direction, Vec<u8>)>,
    dependencies: Dependencies,
    requests: Option<Vec<RequestId>>,
}

impl SendTask {
    /// Send each `(direction, payload)` pair under `tag`.
    pub fn new(tag: Tag, messages: impl IntoIterator<Item = (Direction, Vec<u8>)>) -> Self {
        Self {
            tag,
            messages: messages.into_iter().collect(),
            dependencies: Dependencies::implicit(),
            requests: None,
        }
    }

    /// Replace the dependency set.
    #[must_use]
    pub fn depends_on(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl<C: Config> Task<C> for SendTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Send
    }

    fn setup(&mut self, setup: &TaskSetup) {
        self.dependencies.bind(setup);
    }

    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool {
        if self.requests.is_none() {
            if !self.dependencies.is_satisfied(scheduler) {
                return false;
            }
            let transport = scheduler.transport_mut();
            let started = self
                .messages
                .drain(..)
                .map(|(to, payload)| {
                    transport
                        .isend(to, self.tag, payload)
                        .unwrap_or_else(|err| fatal("SendTask", err))
                })
                .collect();
            self.requests = Some(started);
        }
        let requests = self.requests.as_mut().expect("SendTask::advance: [1]");
        let transport = scheduler.transport_mut();
        requests.retain(|&request| match transport.test(request) {
            Ok(Completion::Pending) => true,
            Ok(Completion::Sent) => false,
            Ok(Completion::Received(_)) => fatal("SendTask", "send request completed as a receive"),
            Err(err) => fatal("SendTask", err),
        });
        requests.is_empty()
    }

    fn describe(&self) -> String {
        match &self.requests {
            None => format!(
                "send tag {} to {} neighbor(s), waiting on {} event(s)",
                self.tag,
                self.messages.len(),
                self.dependencies.pending().len()
            ),
            Some(requests) => format!("send tag {}, {} request(s) in flight", self.tag, requests.len()),
        }
    }
}

/// Non-blocking receives from every direction of a mask.
///
/// Each payload is handed to the sink as soon as it arrives; the task
/// finishes once all directions have delivered.
#[derive(Debug)]
pub struct ReceiveTask {
    tag: Tag,
    mask: ExchangeMask,
    #[debug(skip)]
    sink: Box<dyn FnMut(Direction, Vec<u8>)>,
    dependencies: Dependencies,
    requests: Option<Vec<(Direction, RequestId)>>,
}

impl ReceiveTask {
    /// Receive one message under `tag` from each direction in `mask`.
    pub fn new(tag: Tag, mask: ExchangeMask, sink: impl FnMut(Direction, Vec<u8>) + 'static) -> Self {
        Self {
            tag,
            mask,
            sink: Box::new(sink),
            dependencies: Dependencies::implicit(),
            requests: None,
        }
    }

    /// Replace the dependency set.
    #[must_use]
    pub fn depends_on(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl<C: Config> Task<C> for ReceiveTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Receive
    }

    fn setup(&mut self, setup: &TaskSetup) {
        self.dependencies.bind(setup);
    }

    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool {
        if self.requests.is_none() {
            if !self.dependencies.is_satisfied(scheduler) {
                return false;
            }
            let transport = scheduler.transport_mut();
            let started = self
                .mask
                .iter()
                .map(|from| {
                    let request = transport
                        .irecv(from, self.tag)
                        .unwrap_or_else(|err| fatal("ReceiveTask", err));
                    (from, request)
                })
                .collect();
            self.requests = Some(started);
        }
        let requests = self.requests.as_mut().expect("ReceiveTask::advance: [1]");
        let transport = scheduler.transport_mut();
        let sink = &mut self.sink;
        requests.retain(|&(from, request)| match transport.test(request) {
            Ok(Completion::Pending) => true,
            Ok(Completion::Received(payload)) => {
                sink(from, payload);
                false
            }
            Ok(Completion::Sent) => fatal("ReceiveTask", "receive request completed as a send"),
            Err(err) => fatal("ReceiveTask", err),
        });
        requests.is_empty()
    }

    fn describe(&self) -> String {
        let in_flight = self.requests.as_ref().map_or(0, Vec::len);
        format!(
            "receive tag {} from {}, {in_flight} request(s) in flight",
            self.tag, self.mask
        )
    }
}
