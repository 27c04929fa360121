use serde::{Deserialize, Serialize};

use crate::{types::Stamp, world::network_id::NetworkId};

/// An object as it travels: its identity, its declared parents at publish
/// time, and when it was published. `T` is an `ObjectSnapshot` on the wire and
/// a rebuilt `Box<dyn Replicate>` once decoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkWrapper<T> {
    pub network_id: NetworkId,
    pub object: T,
    /// One entry for attached nodes, none for the root & detached nodes, zero
    /// or more for attributes
    pub parents: Vec<NetworkId>,
    pub published_at: Stamp,
    /// Set only on the publisher's scene root. Subscribers adopt their own
    /// root for this object instead of spawning one.
    pub is_root: bool,
}

impl<T> NetworkWrapper<T> {
    pub fn new(network_id: NetworkId, object: T, parents: Vec<NetworkId>, published_at: Stamp) -> Self {
        Self {
            network_id,
            object,
            parents,
            published_at,
            is_root: false,
        }
    }

    /// Mark this wrapper as carrying the scene root, which never has parents
    pub fn into_root(mut self) -> Self {
        self.is_root = true;
        self.parents.clear();
        self
    }
}
