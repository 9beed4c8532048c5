use crate::{
    queue::{ExecQueue, HostQueue},
    transport::{LoopbackTransport, Transport},
};
use std::time::Duration;

/// Configuration entry-point for instantiating the scheduler.
///
/// A concrete `Config` binds the execution queue and network backends the
/// scheduler drives.
pub trait Config: Sized + 'static {
    /// Ordered execution queue kept in the scheduler's pool.
    type Queue: ExecQueue;
    /// Non-blocking neighbor messaging.
    type Transport: Transport;
}

/// Worker-thread queues with an in-process loopback network.
#[derive(Debug, Copy, Clone)]
pub struct HostConfig;

impl Config for HostConfig {
    type Queue = HostQueue;
    type Transport = LoopbackTransport;
}

/// Runtime knobs of the scheduler.
#[derive(Debug, Clone)]
pub struct Settings {
    /// How long a drain may go without any task finishing before a warning
    /// naming the pending tasks is logged.
    pub stall_warning: Duration,
    /// Yield the controlling thread when a tick finishes nothing, instead of
    /// spinning straight into the next one.
    pub yield_when_idle: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stall_warning: Duration::from_secs(10),
            yield_when_idle: true,
        }
    }
}
