use thiserror::Error;

use crate::types::KindId;

/// Errors that can occur while mapping objects to & from their snapshots
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectKindsError {
    /// Type was never added to the Protocol
    #[error("Object kind {type_name} was not registered with the Protocol")]
    KindNotRegistered { type_name: &'static str },

    /// Snapshot names a kind id outside the registered range (SECURITY: potentially malicious frame)
    #[error("Unknown object kind id {kind_id}, only {registered} kinds are registered")]
    UnknownKindId { kind_id: KindId, registered: usize },

    /// Object's registered type and concrete type disagree
    #[error("Object does not match the registered type {type_name}")]
    DowncastFailed { type_name: &'static str },

    #[error("Failed to serialize {type_name}: {reason}")]
    SerializationFailed {
        type_name: &'static str,
        reason: String,
    },

    #[error("Failed to deserialize {type_name}: {reason}")]
    DeserializationFailed {
        type_name: &'static str,
        reason: String,
    },
}
