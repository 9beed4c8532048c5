//! Non-blocking task/dependency scheduler for device-accelerated simulations.
//!
//! This crate is the runtime that overlaps kernel execution, host-device
//! copies and neighbor communication on a single controlling thread. It:
//! - Keeps every in-flight operation as a [`task::Task`] owned by the
//!   [`executor::Scheduler`], which polls all of them once per tick without
//!   ever blocking.
//! - Expresses "start B only after A" through weak, copyable
//!   [`event::EventHandle`]s: a handle is satisfied exactly when its task is
//!   no longer registered.
//! - Chains sequential code implicitly through transactions, which make the
//!   last submitted task the default dependency of the next one.
//! - Leaves the actual concurrency to ordered execution queues and a
//!   non-blocking network transport.
//!
//! Key modules:
//! - `config`: binds queue and transport backends via the `Config` trait and
//!   holds the runtime `Settings`.
//! - `executor`: the scheduler (submit, lookup, tick, drain, join).
//! - `task`: the `Task` contract and the compute, transfer, network,
//!   exchange and join tasks.
//! - `event`: event handles and task kinds.
//! - `transaction`: the default-dependency stack and its scoped guard.
//! - `queue`: execution queues and the queue pool.
//! - `transport`: non-blocking neighbor messaging.
//! - `mask`: neighbor directions and exchange masks.
//!
//! Quick start:
//! 1. Pick a `Config` (or use `HostConfig`), build a `QueuePool` and a
//!    transport, and create a `Scheduler`.
//! 2. Submit tasks, passing explicit `Dependencies` where needed or opening
//!    a transaction to chain them.
//! 3. Call `tick` from the application loop, `drain_all` at
//!    synchronization points.
//!
//! Device and network failures are fatal: the run aborts with a diagnostic
//! instead of trying to recover a partially failed step.

/// Public interface to configure the scheduler.
///
/// Exposes the `Config` trait binding the queue and transport backends,
/// `HostConfig`, and the runtime `Settings`.
pub mod config;
/// Event handles and task kinds.
pub mod event;
/// The task scheduler.
///
/// Owns the creation-ordered registry of live tasks, runs the poll loop,
/// resolves dependency lookups and publishes completions to observers.
pub mod executor;
/// Neighbor directions and the exchange mask bitset.
pub mod mask;
/// Ordered execution queues and the queue pool.
pub mod queue;
mod sync;
/// Task definitions: the `Task` contract, its setup data, dependency sets
/// and the built-in task kinds.
pub mod task;
/// The default-dependency stack and the scoped `Transaction` guard.
pub mod transaction;
/// Non-blocking messaging with face neighbors.
pub mod transport;
/// Core types used across the crate (ids, tickets, map aliases).
pub mod types;
mod utils;
