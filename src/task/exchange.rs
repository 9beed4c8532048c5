use crate::{
    config::Config,
    event::{EventHandle, TaskKind},
    executor::Scheduler,
    mask::ExchangeMask,
    task::{Task, TaskSetup},
};
use derive_more::Display;

/// The data side of a neighbor exchange: a field or particle buffer that
/// knows how to pack its borders and ship them.
pub trait ExchangeBuffer<C: Config>: core::fmt::Debug {
    /// Submit the operations packing the borders selected by `mask` into
    /// send buffers.
    ///
    /// Runs inside a transaction based on the exchange's initial dependency,
    /// so tasks submitted here chain on it and on each other; the exchange
    /// waits for the last one.
    fn pack(&mut self, scheduler: &mut Scheduler<C>, mask: ExchangeMask);

    /// Start the network transfer of the packed buffers and return the
    /// event completing with it.
    fn transfer(&mut self, scheduler: &mut Scheduler<C>, mask: ExchangeMask) -> EventHandle;
}

/// Stages of an [`ExchangeTask`], in the only order they are visited.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExchangeState {
    /// Submitted, not polled yet.
    Start,
    /// Packing is being issued.
    PackBuffer,
    /// Waiting for the packing to finish.
    WaitPack,
    /// The transfer is being issued.
    IssueTransfer,
    /// Waiting for the transfer to finish.
    WaitTransfer,
    /// Finished.
    Done,
}

/// Multi-stage neighbor exchange: pack borders, then transfer them.
///
/// Every poll costs one dependency lookup, never a wait, so many exchanges
/// (one per direction, say) overlap with each other and with compute.
#[derive(Debug)]
pub struct ExchangeTask<B> {
    buffer: B,
    mask: ExchangeMask,
    state: ExchangeState,
    visited: Vec<ExchangeState>,
    initial: Option<EventHandle>,
    pack_event: EventHandle,
    transfer_event: EventHandle,
}

impl<B> ExchangeTask<B> {
    /// Exchange of `buffer`'s borders in the directions of `mask`, starting
    /// after the default dependency in effect at submit time.
    ///
    /// `mask` must not select both directions of an axis; debug builds
    /// check it.
    pub fn new(buffer: B, mask: ExchangeMask) -> Self {
        debug_assert!(
            !mask.has_opposite_pair(),
            "ExchangeTask::new: mask {mask} selects both directions of an axis"
        );
        Self {
            buffer,
            mask,
            state: ExchangeState::Start,
            visited: vec![ExchangeState::Start],
            initial: None,
            pack_event: EventHandle::NULL,
            transfer_event: EventHandle::NULL,
        }
    }

    /// Start packing after `event` instead of the default dependency.
    #[must_use]
    pub fn after(mut self, event: EventHandle) -> Self {
        self.initial = Some(event);
        self
    }

    /// Current stage.
    #[must_use]
    pub const fn state(&self) -> ExchangeState {
        self.state
    }

    /// Every stage entered so far, in order.
    #[must_use]
    pub fn visited(&self) -> &[ExchangeState] {
        &self.visited
    }

    /// The exchanged buffer.
    pub const fn buffer(&self) -> &B {
        &self.buffer
    }

    fn enter(&mut self, next: ExchangeState) {
        assert!(
            next > self.state,
            "ExchangeTask::enter: {} -> {next} goes backwards",
            self.state
        );
        tracing::trace!(mask = %self.mask, from = %self.state, to = %next, "exchange stage");
        self.state = next;
        self.visited.push(next);
    }
}

impl<C: Config, B: ExchangeBuffer<C>> Task<C> for ExchangeTask<B> {
    fn kind(&self) -> TaskKind {
        TaskKind::Exchange
    }

    fn setup(&mut self, setup: &TaskSetup) {
        self.initial.get_or_insert(setup.default_dependency());
    }

    fn advance(&mut self, scheduler: &mut Scheduler<C>) -> bool {
        match self.state {
            ExchangeState::Start => {
                self.enter(ExchangeState::PackBuffer);
                let mut transaction = scheduler.begin_transaction(self.initial.unwrap_or_default());
                self.buffer.pack(&mut transaction, self.mask);
                self.pack_event = transaction.end();
                self.enter(ExchangeState::WaitPack);
                false
            }
            ExchangeState::WaitPack => {
                if scheduler.lookup_event(self.pack_event).is_some() {
                    return false;
                }
                self.enter(ExchangeState::IssueTransfer);
                self.transfer_event = self.buffer.transfer(scheduler, self.mask);
                self.enter(ExchangeState::WaitTransfer);
                false
            }
            ExchangeState::WaitTransfer => {
                if scheduler.lookup_event(self.transfer_event).is_some() {
                    return false;
                }
                self.enter(ExchangeState::Done);
                true
            }
            ExchangeState::Done => true,
            ExchangeState::PackBuffer | ExchangeState::IssueTransfer => {
                unreachable!("ExchangeTask::advance: transient stage {} left behind", self.state)
            }
        }
    }

    fn describe(&self) -> String {
        format!("exchange {} ({})", self.mask, self.state)
    }
}
