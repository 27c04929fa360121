use serde::{Deserialize, Serialize};

use crate::{
    types::Stamp,
    world::{
        error::ObjectKindsError,
        network_id::NetworkId,
        network_wrapper::NetworkWrapper,
        object_kinds::{ObjectKinds, ObjectSnapshot},
        replicate::Replicate,
    },
};

/// Everything that travels between publisher & subscribers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NetworkEvent<T> {
    /// Full state of one object, plus optional first-sight construction
    /// parameters and side channel payload
    Update {
        wrapper: NetworkWrapper<T>,
        constructor_parameters: Option<Vec<u8>>,
        side_channel: Option<Vec<u8>>,
    },
    /// Reparent a node (`parent: None` detaches it) or add an owner to an attribute
    NewRelation {
        parent: Option<NetworkId>,
        child: NetworkId,
        stamp: Stamp,
    },
    /// Remove one owner from an attribute, or detach a node from this specific parent
    RemoveRelation {
        parent: NetworkId,
        child: NetworkId,
        stamp: Stamp,
    },
    /// Object no longer exists on the publisher
    Remove { network_id: NetworkId, stamp: Stamp },
    /// Ask the publisher to resend the full state of every known object
    RequestInitialization,
}

/// Event as serialized into a frame
pub type WireEvent = NetworkEvent<ObjectSnapshot>;
/// Event after its object has been rebuilt on the receiving side
pub type RemoteEvent = NetworkEvent<Box<dyn Replicate>>;

impl<T> NetworkEvent<T> {
    /// The object this event is about
    pub fn subject(&self) -> Option<NetworkId> {
        match self {
            Self::Update { wrapper, .. } => Some(wrapper.network_id),
            Self::NewRelation { child, .. } | Self::RemoveRelation { child, .. } => Some(*child),
            Self::Remove { network_id, .. } => Some(*network_id),
            Self::RequestInitialization => None,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update { .. })
    }

    /// An `Update` carrying the publisher's scene root
    pub fn is_root_update(&self) -> bool {
        matches!(self, Self::Update { wrapper, .. } if wrapper.is_root)
    }

    /// Flag an `Update` as carrying the scene root. Other events pass through.
    pub fn into_root(self) -> Self {
        match self {
            Self::Update {
                wrapper,
                constructor_parameters,
                side_channel,
            } => Self::Update {
                wrapper: wrapper.into_root(),
                constructor_parameters,
                side_channel,
            },
            other => other,
        }
    }

    fn map_object<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<NetworkEvent<U>, E> {
        Ok(match self {
            Self::Update {
                wrapper,
                constructor_parameters,
                side_channel,
            } => {
                let NetworkWrapper {
                    network_id,
                    object,
                    parents,
                    published_at,
                    is_root,
                } = wrapper;
                NetworkEvent::Update {
                    wrapper: NetworkWrapper {
                        network_id,
                        object: f(object)?,
                        parents,
                        published_at,
                        is_root,
                    },
                    constructor_parameters,
                    side_channel,
                }
            }
            Self::NewRelation {
                parent,
                child,
                stamp,
            } => NetworkEvent::NewRelation {
                parent,
                child,
                stamp,
            },
            Self::RemoveRelation {
                parent,
                child,
                stamp,
            } => NetworkEvent::RemoveRelation {
                parent,
                child,
                stamp,
            },
            Self::Remove { network_id, stamp } => NetworkEvent::Remove { network_id, stamp },
            Self::RequestInitialization => NetworkEvent::RequestInitialization,
        })
    }
}

impl WireEvent {
    /// Rebuild the carried object, if any, through the registered kinds
    pub fn into_remote(self, object_kinds: &ObjectKinds) -> Result<RemoteEvent, ObjectKindsError> {
        self.map_object(|snapshot| object_kinds.read(&snapshot))
    }

    /// Builds an `Update` carrying a full snapshot of `object`
    pub fn update_for(
        object_kinds: &ObjectKinds,
        object: &dyn Replicate,
        network_id: NetworkId,
        parents: Vec<NetworkId>,
        published_at: Stamp,
    ) -> Result<Self, ObjectKindsError> {
        Ok(Self::Update {
            wrapper: NetworkWrapper::new(network_id, object_kinds.write(object)?, parents, published_at),
            constructor_parameters: object.constructor_parameters(),
            side_channel: object.side_channel_data(),
        })
    }
}

impl RemoteEvent {
    /// Re-snapshot the carried object so the event can be sent again
    pub fn into_wire(self, object_kinds: &ObjectKinds) -> Result<WireEvent, ObjectKindsError> {
        self.map_object(|object| object_kinds.write(object.as_ref()))
    }
}
