use thiserror::Error;

use scenecast_shared::{DecoderError, EncodeError, EncoderError, TransportError};

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Subscriber is not connected")]
    NotConnected,
    #[error("Subscriber is already connected")]
    AlreadyConnected,
    #[error("Control frame encoder could not be created: {0}")]
    Encoder(#[from] EncoderError),
    #[error("Frame decoder could not be created: {0}")]
    Decoder(#[from] DecoderError),
    #[error("Control event could not be encoded: {0}")]
    Encode(#[from] EncodeError),
    #[error("Control frame could not be sent: {0}")]
    Transport(#[from] TransportError),
    #[error("Could not spawn the {name} thread: {reason}")]
    ThreadSpawn { name: &'static str, reason: String },
}
