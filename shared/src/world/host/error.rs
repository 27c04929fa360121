use thiserror::Error;

/// Caller errors raised while registering or scanning the local scene.
/// These are returned synchronously and never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityError {
    /// Handle does not refer to an object in the scene
    #[error("Object handle does not refer to an object in the scene")]
    UnknownObject,

    /// Object opted out of synchronization
    #[error("{type_name} does not want to be synchronized")]
    NotSynchronized { type_name: &'static str },

    /// Object's type was never added to the Protocol
    #[error("{type_name} is not a registered object kind, add it to the Protocol first")]
    UnregisteredKind { type_name: &'static str },

    /// Non-root node has no parent
    #[error("{type_name} has no parent, only the scene root may be registered without one")]
    MissingParent { type_name: &'static str },

    /// Node was registered before its parent
    #[error("Parent {parent_type} of {type_name} has not been registered, register it first")]
    ParentNotRegistered {
        type_name: &'static str,
        parent_type: &'static str,
    },

    /// Scan requested before the scene root was registered
    #[error("Scene root has not been registered, call register() before scanning")]
    RootNotRegistered,

    /// Removal requested for an object that was never registered
    #[error("{type_name} was never registered")]
    NotRegistered { type_name: &'static str },
}
