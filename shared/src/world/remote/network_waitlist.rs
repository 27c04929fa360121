use std::collections::HashMap;

use crate::world::{network_event::NetworkEvent, network_id::NetworkId};

/// Why an event could not be applied yet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitReason {
    /// Parent node or attribute owner not seen yet
    Parent,
    /// Object state references an id not seen yet
    Reference,
    /// Event is about an object whose first `Update` has not arrived
    Subject,
}

pub struct Parked<T> {
    pub event: NetworkEvent<T>,
    pub reason: WaitReason,
}

/// Events waiting for an identity to become known, keyed by that identity.
/// Events stay in arrival order per identity and are never dropped while
/// they wait.
pub struct NetworkWaitlist<T> {
    waiting: HashMap<NetworkId, Vec<Parked<T>>>,
    len: usize,
}

impl<T> Default for NetworkWaitlist<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NetworkWaitlist<T> {
    pub fn new() -> Self {
        Self {
            waiting: HashMap::new(),
            len: 0,
        }
    }

    pub fn queue(&mut self, missing: NetworkId, event: NetworkEvent<T>, reason: WaitReason) {
        self.waiting
            .entry(missing)
            .or_default()
            .push(Parked { event, reason });
        self.len += 1;
    }

    /// Everything parked on `network_id`, in the order it was parked
    pub fn take(&mut self, network_id: &NetworkId) -> Vec<Parked<T>> {
        let parked = self.waiting.remove(network_id).unwrap_or_default();
        self.len -= parked.len();
        parked
    }

    /// Drop every parked event about `subject`, wherever it waits. Returns
    /// how many were dropped.
    pub fn purge_subject(&mut self, subject: &NetworkId) -> usize {
        let mut purged = 0;
        self.waiting.retain(|_, parked| {
            let before = parked.len();
            parked.retain(|entry| entry.event.subject().as_ref() != Some(subject));
            purged += before - parked.len();
            !parked.is_empty()
        });
        self.len -= purged;
        purged
    }

    pub fn is_waiting_on(&self, network_id: &NetworkId) -> bool {
        self.waiting.contains_key(network_id)
    }

    /// Identities with at least one event parked on them, ascending
    pub fn waiting_on(&self) -> Vec<NetworkId> {
        let mut ids: Vec<NetworkId> = self.waiting.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
