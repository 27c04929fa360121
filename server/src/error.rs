use thiserror::Error;

use scenecast_shared::{DecoderError, EncoderError, GraphIntegrityError};

#[derive(Debug, Error)]
pub enum PublisherError {
    /// Local scene cannot be registered or scanned as asked
    #[error("Graph integrity error: {0}")]
    Graph(#[from] GraphIntegrityError),

    #[error("Publisher has no socket, call listen() first")]
    NotListening,

    #[error("Publisher is already listening on a socket")]
    AlreadyListening,

    #[error("Publisher is already publishing")]
    AlreadyPublishing,

    #[error("Failed to set up frame encoder: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Failed to set up frame decoder: {0}")]
    Decoder(#[from] DecoderError),

    #[error("Failed to spawn {name} thread: {reason}")]
    ThreadSpawn { name: &'static str, reason: String },
}
