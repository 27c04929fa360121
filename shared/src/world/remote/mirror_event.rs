use crate::world::network_id::NetworkId;

/// What changed in the mirror during one `network_update`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorEvent {
    /// Object created, or the local root adopted
    Spawn(NetworkId),
    /// State merged into an existing object
    Update(NetworkId),
    /// Parent or owners changed
    Relation(NetworkId),
    /// Object removed from the mirror
    Despawn(NetworkId),
}

impl MirrorEvent {
    pub fn network_id(&self) -> NetworkId {
        match self {
            Self::Spawn(network_id)
            | Self::Update(network_id)
            | Self::Relation(network_id)
            | Self::Despawn(network_id) => *network_id,
        }
    }
}
