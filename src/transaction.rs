use crate::{config::Config, event::EventHandle, executor::Scheduler};
use core::ops::{Deref, DerefMut};

/// Stack of default dependencies.
///
/// The bottom entry belongs to no transaction: it is always
/// [`EventHandle::NULL`] and submissions don't change it. Each open
/// transaction pushes an entry that starts at the transaction's base event
/// and is replaced by the handle of every task submitted while it is on top,
/// so sequential submissions chain on each other.
#[derive(Debug)]
pub struct Transactions {
    stack: Vec<EventHandle>,
}

impl Default for Transactions {
    fn default() -> Self {
        Self {
            stack: vec![EventHandle::NULL],
        }
    }
}

impl Transactions {
    /// Dependency newly created tasks wait on when not given explicit ones.
    #[must_use]
    pub fn current_default(&self) -> EventHandle {
        self.stack.last().copied().unwrap_or_default()
    }

    /// Open a transaction whose tasks start after `base`.
    pub fn push_default(&mut self, base: EventHandle) {
        self.stack.push(base);
    }

    /// Close the innermost transaction and return the last event submitted
    /// in it (its base if nothing was submitted). The enclosing default is
    /// left as it was before the push.
    ///
    /// # Panics
    /// If no transaction is open.
    pub fn pop_default(&mut self) -> EventHandle {
        assert!(
            self.depth() > 0,
            "Transactions::pop_default: no open transaction"
        );
        self.stack.pop().unwrap_or_default()
    }

    /// Number of open transactions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Record `event` as the innermost transaction's latest operation.
    /// Does nothing outside a transaction.
    pub(crate) fn record(&mut self, event: EventHandle) {
        if self.depth() > 0
            && let Some(top) = self.stack.last_mut()
        {
            *top = event;
        }
    }
}

/// An open transaction on a scheduler. Closed by [`Transaction::end`] or,
/// on any other exit path, when dropped.
///
/// Derefs to the scheduler, so tasks are submitted through the guard:
///
/// ```ignore
/// let mut tx = scheduler.begin_transaction(copy_in);
/// tx.submit(kernel_a); // waits on copy_in
/// tx.submit(kernel_b); // waits on kernel_a
/// let done = tx.end(); // kernel_b's handle
/// ```
#[must_use = "dropping the guard closes the transaction right away"]
#[derive(Debug)]
pub struct Transaction<'a, C: Config> {
    scheduler: &'a mut Scheduler<C>,
    depth: usize,
}

impl<'a, C: Config> Transaction<'a, C> {
    pub(crate) fn open(scheduler: &'a mut Scheduler<C>, base: EventHandle) -> Self {
        scheduler.transactions_mut().push_default(base);
        let depth = scheduler.transactions().depth();
        Self { scheduler, depth }
    }

    /// Close the transaction and return its last event.
    pub fn end(mut self) -> EventHandle {
        let event = self.close();
        // Already closed; skip the drop-time pop.
        self.depth = 0;
        event
    }

    fn close(&mut self) -> EventHandle {
        let transactions = self.scheduler.transactions_mut();
        assert_eq!(
            transactions.depth(),
            self.depth,
            "Transaction::close: nested transaction left open"
        );
        transactions.pop_default()
    }
}

impl<C: Config> Deref for Transaction<'_, C> {
    type Target = Scheduler<C>;

    fn deref(&self) -> &Scheduler<C> {
        self.scheduler
    }
}

impl<C: Config> DerefMut for Transaction<'_, C> {
    fn deref_mut(&mut self) -> &mut Scheduler<C> {
        self.scheduler
    }
}

impl<C: Config> Drop for Transaction<'_, C> {
    fn drop(&mut self) {
        if self.depth == 0 {
            return;
        }
        if std::thread::panicking() {
            // Unwinding: restore the stack without piling up a second panic.
            let transactions = self.scheduler.transactions_mut();
            while transactions.depth() >= self.depth {
                transactions.pop_default();
            }
            return;
        }
        self.close();
    }
}
