use std::collections::{HashSet, VecDeque};

use crate::world::network_id::NetworkId;

/// Identities removed from the mirror. Holds at most `limit` of them; past
/// that the oldest retirement is forgotten first.
pub struct Tombstones {
    retired: HashSet<NetworkId>,
    order: VecDeque<NetworkId>,
    limit: usize,
}

impl Tombstones {
    pub fn new(limit: usize) -> Self {
        Self {
            retired: HashSet::new(),
            order: VecDeque::new(),
            limit,
        }
    }

    pub fn insert(&mut self, network_id: NetworkId) {
        if !self.retired.insert(network_id) {
            return;
        }
        self.order.push_back(network_id);
        while self.order.len() > self.limit {
            if let Some(oldest) = self.order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }

    pub fn contains(&self, network_id: &NetworkId) -> bool {
        self.retired.contains(network_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
