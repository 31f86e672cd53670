//! Newest-cycle-wins bookkeeping.

use tokio::sync::watch;

/// Proof that a cycle was started. Only the most recent ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket(u64);

impl CycleTicket {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Issues [`CycleTicket`]s; each new one supersedes all earlier ones.
///
/// Waiters parked in [`CycleGuard::superseded`] wake as soon as a newer
/// ticket is issued.
#[derive(Debug)]
pub struct CycleGuard {
    latest: watch::Sender<u64>,
}

impl Default for CycleGuard {
    fn default() -> Self {
        Self {
            latest: watch::Sender::new(0),
        }
    }
}

impl CycleGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> CycleTicket {
        self.latest.send_modify(|latest| *latest += 1);
        CycleTicket(*self.latest.borrow())
    }

    #[must_use]
    pub fn is_current(&self, ticket: CycleTicket) -> bool {
        *self.latest.borrow() == ticket.0
    }

    /// Resolves once `ticket` is no longer current.
    pub async fn superseded(&self, ticket: CycleTicket) {
        let mut latest = self.latest.subscribe();
        // Errors only once the sender is gone, and `self` keeps it alive.
        let _ = latest.wait_for(|&id| id != ticket.0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::poll_fn;
    use std::pin::pin;
    use std::task::Poll;

    #[test]
    fn newer_ticket_supersedes_older() {
        let guard = CycleGuard::new();
        let a = guard.begin();
        assert!(guard.is_current(a));
        let b = guard.begin();
        assert!(!guard.is_current(a));
        assert!(guard.is_current(b));
        assert!(b.id() > a.id());
    }

    #[tokio::test]
    async fn superseded_waits_for_a_newer_ticket() {
        let guard = CycleGuard::new();
        let a = guard.begin();
        let mut waiting = pin!(guard.superseded(a));
        let pending = poll_fn(|cx| Poll::Ready(waiting.as_mut().poll(cx).is_pending())).await;
        assert!(pending);

        guard.begin();
        waiting.await;
    }

    #[tokio::test]
    async fn superseded_resolves_at_once_for_a_stale_ticket() {
        let guard = CycleGuard::new();
        let a = guard.begin();
        guard.begin();
        guard.superseded(a).await;
    }
}
