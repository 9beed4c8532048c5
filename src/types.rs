use core::num::NonZeroU64;
use indexmap::IndexMap as _IndexMap;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap as _HashMap;

/// Identifier of a task registered with the scheduler.
///
/// Ids are handed out monotonically and never reused, so an id that has
/// been observed as finished stays finished.
pub type TaskId = NonZeroU64;

/// Position of an operation in an execution queue's submission order.
///
/// The first operation enqueued on a queue gets ticket `1`.
pub type Ticket = u64;

pub(crate) type HashMap<K, V> = _HashMap<K, V, FxBuildHasher>;
/// `IndexMap` type with fast hasher.
pub type IndexMap<K, V> = _IndexMap<K, V, FxBuildHasher>;
