//! Latest-wins ordering of responses

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Sequence number handed out when a request is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Discards responses that arrive after a newer one was applied
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a request at dispatch time
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Run `apply` if no newer ticket has been applied yet
    ///
    /// Returns `false` when the response is stale and was discarded.
    pub fn apply_if_latest(&self, ticket: Ticket, apply: impl FnOnce()) -> bool {
        let mut applied = self.applied.lock();
        if ticket.0 <= *applied {
            return false;
        }
        *applied = ticket.0;
        apply();
        true
    }

    /// Highest ticket applied so far; 0 before the first
    pub fn last_applied(&self) -> u64 {
        *self.applied.lock()
    }
}
