use thiserror::Error;

use crate::world::{network_id::NetworkId, replicate::UpdateError};

/// Errors that can occur while applying remote events to the mirror
///
/// These are logged and the offending event skipped; they never stop the
/// subscriber from processing the events that follow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteWorldError {
    /// Id is mapped but the scene no longer holds the object
    #[error("Object {network_id} is mapped but missing from the scene")]
    ObjectMissing { network_id: NetworkId },

    /// Id is mapped but has no bookkeeping record
    #[error("No record for mapped object {network_id}")]
    RecordMissing { network_id: NetworkId },

    /// A second root arrived while the local root already mirrors another id
    #[error("Scene root already mirrors {existing}, ignoring root {incoming}")]
    DuplicateRoot {
        existing: NetworkId,
        incoming: NetworkId,
    },

    /// Merge reported an id as missing although it is known
    #[error("Merge of {network_id} reported known object {missing} as missing")]
    SpuriousNotFound {
        network_id: NetworkId,
        missing: NetworkId,
    },

    /// Merge failed for a reason other than an unresolved reference
    #[error("Failed to merge update into {network_id}: {source}")]
    MergeFailed {
        network_id: NetworkId,
        source: UpdateError,
    },
}
