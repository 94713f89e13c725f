// src/engine/debounce.rs

//! Single-slot debounce scheduler.
//!
//! The scheduler owns at most one pending action. Scheduling a new one
//! aborts the previous timer task; the action itself is delivered as an
//! event on the runtime channel, so it runs on the same loop as every
//! watcher callback.
//!
//! Aborting a Tokio task that has already passed its `sleep` cannot take
//! back a message it already sent. Every scheduled action therefore
//! carries a [`Ticket`], and the runtime must [`claim`](DebounceScheduler::claim)
//! it before acting. Only the ticket of the live pending action can be
//! claimed, and only once.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

/// Identifies one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn get(self) -> u64 {
        self.0
    }
}

struct PendingReload {
    ticket: Ticket,
    deadline: Instant,
    handle: JoinHandle<()>,
}

/// Coalesces bursts of triggers into one delayed event, last call wins.
pub struct DebounceScheduler<E> {
    tx: mpsc::UnboundedSender<E>,
    last_ticket: u64,
    pending: Option<PendingReload>,
}

impl<E> fmt::Debug for DebounceScheduler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebounceScheduler")
            .field("last_ticket", &self.last_ticket)
            .field("pending", &self.pending.as_ref().map(|p| p.ticket))
            .finish()
    }
}

impl<E: Send + 'static> DebounceScheduler<E> {
    pub fn new(tx: mpsc::UnboundedSender<E>) -> Self {
        Self {
            tx,
            last_ticket: 0,
            pending: None,
        }
    }

    /// Cancel whatever is pending, then deliver `action(ticket)` on the
    /// channel once `delay` has elapsed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_after<F>(&mut self, delay: Duration, action: F) -> Ticket
    where
        F: FnOnce(Ticket) -> E + Send + 'static,
    {
        self.cancel();

        self.last_ticket += 1;
        let ticket = Ticket(self.last_ticket);
        let deadline = Instant::now() + delay;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            trace!(ticket = ticket.get(), "debounce timer elapsed");
            // Receiver gone means the runtime is shutting down.
            let _ = tx.send(action(ticket));
        });

        debug!(ticket = ticket.get(), ?delay, "scheduled debounced action");
        self.pending = Some(PendingReload {
            ticket,
            deadline,
            handle,
        });
        ticket
    }

    /// Cancel the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            debug!(ticket = pending.ticket.get(), "cancelled debounced action");
        }
    }

    /// Consume the pending slot if `ticket` is the live action.
    ///
    /// Returns false for stale tickets (superseded or cancelled), which the
    /// caller must then ignore.
    pub fn claim(&mut self, ticket: Ticket) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {
                self.pending = None;
                true
            }
            _ => {
                trace!(ticket = ticket.get(), "ignoring stale debounce ticket");
                false
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }
}

impl<E> Drop for DebounceScheduler<E> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}
