#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

mod common;

use common::{TestConfig, retire_all, run_to_completion, scheduler};
use eventsys::{
    event::{EventHandle, TaskKind},
    executor::Scheduler,
    queue::{DeviceError, QueueId},
    task::{ComputeTask, CopyDirection, Dependencies, Task, TransferTask},
    transaction::Transactions,
};
use std::panic::{self, AssertUnwindSafe};

fn noop() -> Result<(), DeviceError> {
    Ok(())
}

#[test]
fn push_pop_restores_previous_default() {
    let mut s = scheduler(1);
    let a = s.submit(ComputeTask::new("a", QueueId::new(0), noop));
    let b = s.submit(ComputeTask::new("b", QueueId::new(0), noop));

    let transactions = s.transactions_mut();
    assert!(transactions.current_default().is_null());
    transactions.push_default(a);
    assert_eq!(transactions.current_default(), a);
    transactions.push_default(b);
    assert_eq!(transactions.current_default(), b);
    assert_eq!(transactions.depth(), 2);

    assert_eq!(transactions.pop_default(), b);
    assert_eq!(transactions.current_default(), a);
    assert_eq!(transactions.pop_default(), a);
    assert!(transactions.current_default().is_null());
    assert_eq!(transactions.depth(), 0);
}

#[test]
#[should_panic(expected = "no open transaction")]
fn pop_without_transaction_panics() {
    Transactions::default().pop_default();
}

#[test]
fn submissions_chain_inside_a_transaction() {
    let mut s = scheduler(2);
    let base = s.submit(TransferTask::new(
        CopyDirection::HostToDevice,
        16,
        QueueId::new(0),
        noop,
    ));

    let mut tx = s.begin_transaction(base);
    let first = tx.submit(ComputeTask::new("first", QueueId::new(1), noop));
    assert_eq!(tx.transactions().current_default(), first);
    let second = tx.submit(ComputeTask::new("second", QueueId::new(1), noop));
    let last = tx.end();
    assert_eq!(last, second);
    assert!(s.transactions().current_default().is_null());

    // Each kernel waits for its predecessor; the first for the base copy.
    s.tick();
    assert_eq!(s.queues().get(QueueId::new(0)).pending(), 1);
    assert_eq!(s.queues().get(QueueId::new(1)).pending(), 0);
    s.queues().get(QueueId::new(0)).retire_all();
    s.tick();
    assert!(s.is_finished(base));
    assert_eq!(s.queues().get(QueueId::new(1)).pending(), 1);
    s.queues().get(QueueId::new(1)).retire_all();
    s.tick();
    assert!(s.is_finished(first));
    assert!(!s.is_finished(second));
    assert_eq!(s.queues().get(QueueId::new(1)).pending(), 1);
    run_to_completion(&mut s);
}

#[test]
fn empty_transaction_returns_its_base() {
    let mut s = scheduler(1);
    let base = s.submit(ComputeTask::new("base", QueueId::new(0), noop));
    let tx = s.begin_transaction(base);
    assert_eq!(tx.end(), base);
    assert_eq!(s.begin_transaction(EventHandle::NULL).end(), EventHandle::NULL);
}

#[test]
fn no_chaining_outside_transactions() {
    let mut s = scheduler(2);
    s.submit(ComputeTask::new("a", QueueId::new(0), noop));
    s.submit(ComputeTask::new("b", QueueId::new(1), noop));
    assert!(s.transactions().current_default().is_null());

    // Both are issued on the first tick.
    s.tick();
    assert_eq!(retire_all(&s), 2);
    assert_eq!(s.tick(), 2);
}

#[test]
fn explicit_dependencies_bypass_the_default() {
    let mut s = scheduler(2);
    let slow = s.submit(ComputeTask::new("slow", QueueId::new(0), noop));

    let mut tx = s.begin_transaction(slow);
    let chained = tx.submit(ComputeTask::new("chained", QueueId::new(1), noop));
    let free = tx.submit(
        ComputeTask::new("free", QueueId::new(1), noop).depends_on(Dependencies::none()),
    );
    // The explicit task still becomes the transaction's latest event.
    assert_eq!(tx.end(), free);

    s.tick();
    assert!(!s.is_finished(chained));
    assert_eq!(s.queues().get(QueueId::new(1)).pending(), 1);
    s.queues().get(QueueId::new(1)).retire_all();
    s.tick();
    assert!(s.is_finished(free));
    assert!(!s.is_finished(chained));
}

#[test]
fn nested_transactions_restore_the_outer_chain() {
    let mut s = scheduler(1);
    let mut outer = s.begin_transaction(EventHandle::NULL);
    let a = outer.submit(ComputeTask::new("a", QueueId::new(0), noop));
    let inner_last = {
        let mut inner = outer.begin_transaction(a);
        inner.submit(ComputeTask::new("b", QueueId::new(0), noop));
        inner.end()
    };
    assert_eq!(outer.transactions().current_default(), a);
    assert_ne!(inner_last, a);
    let c = outer.submit(ComputeTask::new("c", QueueId::new(0), noop));
    assert_eq!(outer.end(), c);
    run_to_completion(&mut s);
}

#[test]
fn dropped_guard_closes_the_transaction() {
    let mut s = scheduler(1);
    {
        let mut tx = s.begin_transaction(EventHandle::NULL);
        tx.submit(ComputeTask::new("a", QueueId::new(0), noop));
        assert_eq!(tx.transactions().depth(), 1);
    }
    assert_eq!(s.transactions().depth(), 0);
    assert!(s.transactions().current_default().is_null());
}

#[test]
fn panicking_scope_closes_the_transaction() {
    let mut s = scheduler(1);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut tx = s.begin_transaction(EventHandle::NULL);
        tx.submit(ComputeTask::new("a", QueueId::new(0), noop));
        let _inner = tx.begin_transaction(EventHandle::NULL);
        panic!("interrupted");
    }));
    assert!(result.is_err());
    assert_eq!(s.transactions().depth(), 0);
    assert!(s.transactions().current_default().is_null());
}

/// Submits one kernel on queue 1 from its first poll and finishes with it.
#[derive(Debug)]
struct Spawner {
    child: Option<EventHandle>,
}

impl Task<TestConfig> for Spawner {
    fn kind(&self) -> TaskKind {
        TaskKind::LogicalAnd
    }

    fn advance(&mut self, scheduler: &mut Scheduler<TestConfig>) -> bool {
        match self.child {
            None => {
                self.child = Some(scheduler.submit(ComputeTask::new("child", QueueId::new(1), noop)));
                false
            }
            Some(child) => scheduler.is_finished(child),
        }
    }

    fn describe(&self) -> String {
        "spawner".to_owned()
    }
}

#[test]
fn tasks_spawned_while_polling_ignore_the_open_transaction() {
    let mut s = scheduler(2);
    let mut tx = s.begin_transaction(EventHandle::NULL);
    let blocker = tx.submit(ComputeTask::deferred("blocker", QueueId::new(0), noop));
    let spawner = tx.submit(Spawner { child: None });

    tx.tick();
    // The child neither waits on the spawner nor on the blocker before it.
    assert_eq!(tx.len(), 3);
    assert_eq!(tx.queues().get(QueueId::new(1)).pending(), 1);
    assert_eq!(tx.transactions().depth(), 1);
    assert_eq!(tx.transactions().current_default(), spawner);

    tx.queues().get(QueueId::new(1)).retire_all();
    tx.tick();
    tx.tick();
    assert!(tx.is_finished(spawner));
    assert!(!tx.is_finished(blocker));
    assert_eq!(tx.end(), spawner);
    assert!(s.transactions().current_default().is_null());
}
