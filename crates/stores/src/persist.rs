//! In-flight persist-task accounting shared by the state containers.
//!
//! Mutations persist fire-and-forget: the caller gets no acknowledgement
//! and failures are logged, not raised. The queue exists so shutdown
//! paths (the CLI, tests) can still wait for quiescence, and so a
//! container can tell whether writes are outstanding.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Default)]
pub(crate) struct PersistQueue {
    pending: AtomicUsize,
    idle: Notify,
}

impl PersistQueue {
    /// Record a newly spawned persist task.
    pub(crate) fn begin(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a finished persist task, waking settled-waiters on the
    /// last one.
    pub(crate) fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Wait until no persist task is in flight.
    pub(crate) async fn settled(&self) {
        loop {
            // Register interest before re-checking, so a finish() racing
            // with the check still wakes us.
            let notified = self.idle.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_settled_returns_immediately_when_idle() {
        let queue = PersistQueue::default();
        queue.settled().await;
    }

    #[tokio::test]
    async fn test_settled_waits_for_last_task() {
        let queue = Arc::new(PersistQueue::default());
        queue.begin();
        queue.begin();

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.settled().await })
        };

        queue.finish();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        queue.finish();
        waiter.await.expect("settled waiter panicked");
    }
}
