//! Single-flight coordination for token refresh.
//!
//! Many requests can observe an expired access token at once; the
//! backend must see exactly one refresh call per expiry event. The
//! coordinator hands the first caller a leader ticket and every
//! concurrent caller a waiter ticket holding a oneshot receiver. The
//! leader performs the exchange and then completes the round: waiters
//! are fulfilled in FIFO enqueue order (each replays its own request, so
//! completion order across replays is still unordered), the queue is
//! emptied, and the flag resets, exactly once per round, success or
//! failure.

use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::RefreshError;

/// Outcome fanned out to waiters: the new access token, or the shared
/// failure.
pub(crate) type RefreshOutcome = Result<String, RefreshError>;

/// Ticket handed to a caller that hit an expired token.
pub(crate) enum RefreshTicket {
    /// This caller performs the refresh and must call
    /// [`RefreshCoordinator::complete`].
    Leader,
    /// A refresh is already in flight; await the shared outcome.
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Default)]
struct RefreshQueue {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// The `Idle`/`Refreshing` state machine guarding the refresh endpoint.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    queue: Mutex<RefreshQueue>,
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Join the current round: become the leader if idle, otherwise
    /// enqueue.
    pub(crate) fn join(&self) -> RefreshTicket {
        let mut queue = self
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if queue.refreshing {
            let (tx, rx) = oneshot::channel();
            queue.waiters.push(tx);
            RefreshTicket::Waiter(rx)
        } else {
            queue.refreshing = true;
            RefreshTicket::Leader
        }
    }

    /// End the round: drain waiters in FIFO order with the shared
    /// outcome and return to idle. Called exactly once per leader.
    pub(crate) fn complete(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut queue = self
                .queue
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            queue.refreshing = false;
            std::mem::take(&mut queue.waiters)
        };

        tracing::debug!(waiters = waiters.len(), ok = outcome.is_ok(), "refresh round complete");

        for waiter in waiters {
            // A waiter whose request future was dropped is gone; that is
            // its caller's business.
            let _ = waiter.send(outcome.clone());
        }
    }

    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .waiters
            .len()
    }
}
