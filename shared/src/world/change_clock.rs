use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Stamp;

static CLOCK: AtomicU64 = AtomicU64::new(1);

/// Process-wide monotonic counter. Objects stamp their mutations with it and
/// the publisher stamps its publications with it, so "changed since last
/// published" is a plain comparison of two stamps.
pub struct ChangeClock;

impl ChangeClock {
    /// Returns a fresh stamp, strictly greater than every stamp handed out before
    pub fn tick() -> Stamp {
        CLOCK.fetch_add(1, Ordering::SeqCst)
    }

    /// The next stamp `tick` will hand out
    pub fn peek() -> Stamp {
        CLOCK.load(Ordering::SeqCst)
    }
}

/// Last-change marker to embed in replicable objects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeMarker {
    last_change: Stamp,
}

impl ChangeMarker {
    pub fn new() -> Self {
        Self {
            last_change: ChangeClock::tick(),
        }
    }

    /// Record an externally visible mutation
    pub fn mark(&mut self) {
        self.last_change = ChangeClock::tick();
    }

    pub fn last_change(&self) -> Stamp {
        self.last_change
    }
}
