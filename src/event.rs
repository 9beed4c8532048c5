use crate::types::TaskId;
use core::{
    fmt,
    hash::{Hash, Hasher},
};
use derive_more::Display;

/// What a task does. Carried by every [`EventHandle`] and reported to
/// completion observers.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TaskKind {
    /// A kernel launch on an execution queue.
    #[display("kernel")]
    Kernel,
    /// Host to device copy.
    #[display("copy h2d")]
    CopyHostToDevice,
    /// Device to host copy.
    #[display("copy d2h")]
    CopyDeviceToHost,
    /// Device to device copy.
    #[display("copy d2d")]
    CopyDeviceToDevice,
    /// Non-blocking sends to neighbors.
    #[display("send")]
    Send,
    /// Non-blocking receives from neighbors.
    #[display("receive")]
    Receive,
    /// Pack-then-transfer neighbor exchange.
    #[display("exchange")]
    Exchange,
    /// Fan-in over several events.
    #[display("logical and")]
    LogicalAnd,
}

impl TaskKind {
    /// Whether the task is bound to an execution queue.
    #[must_use]
    pub const fn is_device(self) -> bool {
        matches!(
            self,
            Self::Kernel | Self::CopyHostToDevice | Self::CopyDeviceToHost | Self::CopyDeviceToDevice
        )
    }

    /// Whether the task talks to the network.
    #[must_use]
    pub const fn is_network(self) -> bool {
        matches!(self, Self::Send | Self::Receive | Self::Exchange)
    }
}

/// Weak, copyable reference to the completion of a task.
///
/// A handle never keeps its task alive. It is satisfied once the scheduler no
/// longer has a live task with its id, and from then on it stays satisfied.
/// [`EventHandle::NULL`] is satisfied from the start.
///
/// Equality and hashing only look at the task id.
#[derive(Copy, Clone, Default)]
pub struct EventHandle {
    task: Option<(TaskId, TaskKind)>,
}

impl EventHandle {
    /// The already satisfied handle.
    pub const NULL: Self = Self { task: None };

    pub(crate) const fn new(id: TaskId, kind: TaskKind) -> Self {
        Self {
            task: Some((id, kind)),
        }
    }

    /// Id of the referenced task, `None` for the null handle.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        match self.task {
            Some((id, _)) => Some(id),
            None => None,
        }
    }

    /// Kind of the referenced task, `None` for the null handle.
    #[must_use]
    pub const fn kind(&self) -> Option<TaskKind> {
        match self.task {
            Some((_, kind)) => Some(kind),
            None => None,
        }
    }

    /// Whether this is the null handle.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.task.is_none()
    }
}

impl PartialEq for EventHandle {
    fn eq(&self, other: &Self) -> bool {
        self.task_id() == other.task_id()
    }
}

impl Eq for EventHandle {}

impl Hash for EventHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.task_id().hash(state);
    }
}

impl fmt::Debug for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task {
            Some((id, kind)) => write!(f, "EventHandle(#{id} {kind})"),
            None => f.write_str("EventHandle(null)"),
        }
    }
}

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task {
            Some((id, kind)) => write!(f, "#{id} ({kind})"),
            None => f.write_str("null"),
        }
    }
}
