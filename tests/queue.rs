#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

use eventsys::queue::{
    DeviceError, ExecQueue, HostQueue, ManualQueue, QueueError, QueueId, QueuePool,
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

fn wait_retired(queue: &impl ExecQueue, ticket: u64) -> Result<(), QueueError> {
    while !queue.poll(ticket)? {
        thread::yield_now();
    }
    Ok(())
}

#[test]
fn host_queue_runs_in_enqueue_order() {
    let queue = HostQueue::spawn(0);
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut last = 0;
    for step in 0..16 {
        let log = log.clone();
        last = queue.enqueue(Box::new(move || {
            log.lock().unwrap().push(step);
            Ok(())
        }));
    }
    assert_eq!(last, 16);
    wait_retired(&queue, last).unwrap();
    assert_eq!(queue.retired(), 16);
    assert_eq!(*log.lock().unwrap(), (0..16).collect::<Vec<_>>());
}

#[test]
fn host_queue_poll_does_not_block() {
    let queue = HostQueue::spawn(0);
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let ticket = queue.enqueue(Box::new(move || {
        gate.recv().map_err(|_| DeviceError::new("gate closed"))
    }));
    assert_eq!(queue.poll(ticket), Ok(false));
    thread::sleep(Duration::from_millis(5));
    assert_eq!(queue.poll(ticket), Ok(false));
    release.send(()).unwrap();
    wait_retired(&queue, ticket).unwrap();
}

#[test]
fn host_queue_reports_failures_to_later_tickets() {
    let queue = HostQueue::spawn(3);
    let ok = queue.enqueue(Box::new(|| Ok(())));
    let bad = queue.enqueue(Box::new(|| Err(DeviceError::new("out of memory"))));
    let after = queue.enqueue(Box::new(|| Ok(())));
    wait_retired(&queue, ok).unwrap();

    let err = wait_retired(&queue, after).unwrap_err();
    assert_eq!(
        err,
        QueueError::Failed {
            queue: 3,
            ticket: bad,
            source: DeviceError::new("out of memory"),
        }
    );
    assert_eq!(err.to_string(), "operation #2 on queue 3 failed");
    assert_eq!(queue.poll(ok), Ok(true));
}

#[test]
fn host_queue_turns_panics_into_failures() {
    let queue = HostQueue::spawn(0);
    let ticket = queue.enqueue(Box::new(|| panic!("kernel crashed")));
    let err = wait_retired(&queue, ticket).unwrap_err();
    assert!(matches!(err, QueueError::Failed { ticket: 1, .. }));
}

#[test]
fn dropping_host_queue_finishes_enqueued_work() {
    let ran = Arc::new(AtomicUsize::new(0));
    {
        let queue = HostQueue::spawn(0);
        for _ in 0..8 {
            let ran = ran.clone();
            queue.enqueue(Box::new(move || {
                thread::sleep(Duration::from_millis(1));
                ran.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }));
        }
    }
    assert_eq!(ran.load(Ordering::Relaxed), 8);
}

#[test]
fn unknown_tickets_are_rejected() {
    let host = HostQueue::spawn(1);
    assert_eq!(
        host.poll(1),
        Err(QueueError::UnknownTicket { queue: 1, ticket: 1 })
    );
    let manual = ManualQueue::new(2);
    assert_eq!(
        manual.poll(5),
        Err(QueueError::UnknownTicket { queue: 2, ticket: 5 })
    );
}

#[test]
fn manual_queue_runs_only_when_told() {
    let queue = ManualQueue::new(0);
    let first = queue.enqueue(Box::new(|| Ok(())));
    let second = queue.enqueue(Box::new(|| Ok(())));
    assert_eq!(queue.pending(), 2);
    assert_eq!(queue.poll(first), Ok(false));

    assert!(queue.retire_next());
    assert_eq!(queue.poll(first), Ok(true));
    assert_eq!(queue.poll(second), Ok(false));
    assert_eq!(queue.retire_all(), 1);
    assert_eq!(queue.retired(), second);
    assert!(!queue.retire_next());
}

#[test]
fn manual_queue_failure() {
    let queue = ManualQueue::new(4);
    let bad = queue.enqueue(Box::new(|| Err(DeviceError::new("bad launch"))));
    queue.retire_all();
    let Err(QueueError::Failed { queue: 4, ticket, source }) = queue.poll(bad) else {
        panic!("expected a failure");
    };
    assert_eq!(ticket, bad);
    assert_eq!(source.to_string(), "device operation failed: bad launch");
}

#[test]
fn pool_hands_out_queues_round_robin() {
    let mut pool = QueuePool::new(3, ManualQueue::new);
    let picked: Vec<_> = (0..7).map(|_| pool.next().index()).collect();
    assert_eq!(picked, [0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.ids().collect::<Vec<_>>(), [QueueId::new(0), QueueId::new(1), QueueId::new(2)]);
    assert_eq!(QueueId::new(2).to_string(), "queue#2");
}

#[test]
#[should_panic(expected = "out of 2 queues")]
fn pool_rejects_foreign_ids() {
    let pool = QueuePool::new(2, ManualQueue::new);
    let _ = pool.get(QueueId::new(2));
}

#[test]
#[should_panic(expected = "at least one queue")]
fn pool_cannot_be_empty() {
    let _ = QueuePool::new(0, ManualQueue::new);
}
