use std::{any::Any, fmt};

use thiserror::Error;

use crate::{types::Stamp, world::network_id::NetworkId};

/// Role an object plays in the scene graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Structural member with exactly one parent (none for the root)
    Node,
    /// Sub-component owned by zero or more nodes, may be shared
    Attribute,
}

/// Type-erased access used to downcast inside `Replicate::update`.
/// Implemented for every `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lets an object check whether the ids it references are known locally
pub trait NetworkIdResolver {
    fn has_network_id(&self, network_id: &NetworkId) -> bool;

    /// `Err(UpdateError::NotFound)` unless `network_id` is known
    fn require(&self, network_id: &NetworkId) -> Result<(), UpdateError> {
        if self.has_network_id(network_id) {
            Ok(())
        } else {
            Err(UpdateError::NotFound(*network_id))
        }
    }
}

/// Failure modes of merging an incoming snapshot into a local object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// The incoming state references an object this side has not seen yet.
    /// The event is parked until that id is known.
    #[error("Referenced object {0} is not known yet")]
    NotFound(NetworkId),

    /// The incoming object is a different concrete type than the local one
    #[error("Cannot merge a {found} into a {expected}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Side channel or constructor payload could not be interpreted
    #[error("Invalid side channel data: {reason}")]
    InvalidSideChannel { reason: String },
}

/// The contract an object must fulfil to be mirrored across the network
pub trait Replicate: AsAny + Send + Sync + 'static {
    /// Identity slot, `None` until the object has been registered
    fn network_id(&self) -> Option<NetworkId>;

    fn set_network_id(&mut self, network_id: NetworkId);

    /// Stamp of the most recent externally visible mutation
    fn last_change(&self) -> Stamp;

    /// Merge `incoming` into `self`. Must fail with `UpdateError::NotFound`
    /// when `incoming` references an id `resolver` does not know.
    fn update(
        &mut self,
        incoming: &dyn Replicate,
        resolver: &dyn NetworkIdResolver,
        side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError>;

    /// Boxed duplicate of this object
    fn copy_to_box(&self) -> Box<dyn Replicate>;

    /// Human readable kind name used in logs
    fn kind_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn classification(&self) -> Classification {
        Classification::Node
    }

    /// Opt-in flag, objects returning false are never registered
    fn wants_sync(&self) -> bool {
        true
    }

    /// Opaque payload the subscriber needs to build its local instance
    fn constructor_parameters(&self) -> Option<Vec<u8>> {
        None
    }

    /// Builds a local instance from `constructor_parameters`. `None` means
    /// unsupported and the incoming object is used as-is.
    fn construct_with_parameters(&self, _parameters: &[u8]) -> Option<Box<dyn Replicate>> {
        None
    }

    /// Opaque extra payload delivered alongside every update
    fn side_channel_data(&self) -> Option<Vec<u8>> {
        None
    }
}

impl fmt::Debug for dyn Replicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replicate")
            .field("kind", &self.kind_name())
            .field("network_id", &self.network_id())
            .finish()
    }
}
