#![allow(dead_code)]

use eventsys::{
    config::{Config, Settings},
    executor::Scheduler,
    mask::Dim,
    queue::{ManualQueue, QueuePool},
    transport::LoopbackTransport,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub struct TestConfig;

impl Config for TestConfig {
    type Queue = ManualQueue;
    type Transport = LoopbackTransport;
}

pub fn scheduler(queues: usize) -> Scheduler<TestConfig> {
    scheduler_with_latency(queues, 0)
}

/// Route scheduler logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn scheduler_with_latency(queues: usize, latency: u32) -> Scheduler<TestConfig> {
    init_tracing();
    Scheduler::new(
        Settings::default(),
        QueuePool::new(queues, ManualQueue::new),
        LoopbackTransport::with_latency(Dim::Three, latency),
    )
}

/// Retire everything on every queue.
pub fn retire_all(scheduler: &Scheduler<TestConfig>) -> usize {
    scheduler
        .queues()
        .ids()
        .map(|id| scheduler.queues().get(id).retire_all())
        .sum()
}

/// Alternate ticks and queue retirement until nothing is live.
pub fn run_to_completion(scheduler: &mut Scheduler<TestConfig>) {
    for _ in 0..1000 {
        if scheduler.is_empty() {
            return;
        }
        scheduler.tick();
        retire_all(scheduler);
    }
    panic!("scheduler still has live tasks: {scheduler:?}");
}
