use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::world::{
    network_event::{NetworkEvent, WireEvent},
    network_id::NetworkId,
};

/// Latest `Update` published for every live object. Written by the caller
/// thread, read by the send loop when a subscriber asks for initialization.
#[derive(Clone, Default)]
pub struct PublishedObjects {
    updates: Arc<Mutex<BTreeMap<NetworkId, WireEvent>>>,
}

impl PublishedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<NetworkId, WireEvent>> {
        // a panic while holding the lock cannot leave the map half-written
        match self.updates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn insert(&self, network_id: NetworkId, update: WireEvent) {
        self.guard().insert(network_id, update);
    }

    /// Keep the cached declared parents in step with relation events
    pub(crate) fn set_parents(&self, network_id: &NetworkId, parents: &[NetworkId]) {
        if let Some(NetworkEvent::Update { wrapper, .. }) = self.guard().get_mut(network_id) {
            wrapper.parents = parents.to_vec();
        }
    }

    pub(crate) fn remove(&self, network_id: &NetworkId) {
        self.guard().remove(network_id);
    }

    pub fn contains(&self, network_id: &NetworkId) -> bool {
        self.guard().contains_key(network_id)
    }

    /// Full resync: one `Update` per known object, in discovery order
    pub fn initialization_events(&self) -> Vec<WireEvent> {
        self.guard().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}
