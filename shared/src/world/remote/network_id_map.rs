use std::{collections::HashMap, hash::Hash};

use crate::world::{network_id::NetworkId, replicate::NetworkIdResolver};

/// Bidirectional map between network identities and local scene handles
pub struct NetworkIdMap<E: Copy + Eq + Hash> {
    id_to_handle: HashMap<NetworkId, E>,
    handle_to_id: HashMap<E, NetworkId>,
}

impl<E: Copy + Eq + Hash> Default for NetworkIdMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy + Eq + Hash> NetworkIdMap<E> {
    pub fn new() -> Self {
        Self {
            id_to_handle: HashMap::new(),
            handle_to_id: HashMap::new(),
        }
    }

    pub fn insert(&mut self, network_id: NetworkId, handle: E) {
        if let Some(previous) = self.id_to_handle.insert(network_id, handle) {
            self.handle_to_id.remove(&previous);
        }
        self.handle_to_id.insert(handle, network_id);
    }

    pub fn remove(&mut self, network_id: &NetworkId) -> Option<E> {
        let handle = self.id_to_handle.remove(network_id)?;
        self.handle_to_id.remove(&handle);
        Some(handle)
    }

    pub fn handle(&self, network_id: &NetworkId) -> Option<E> {
        self.id_to_handle.get(network_id).copied()
    }

    pub fn network_id(&self, handle: &E) -> Option<NetworkId> {
        self.handle_to_id.get(handle).copied()
    }

    pub fn contains(&self, network_id: &NetworkId) -> bool {
        self.id_to_handle.contains_key(network_id)
    }

    pub fn len(&self) -> usize {
        self.id_to_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_handle.is_empty()
    }
}

impl<E: Copy + Eq + Hash> NetworkIdResolver for NetworkIdMap<E> {
    fn has_network_id(&self, network_id: &NetworkId) -> bool {
        self.contains(network_id)
    }
}
