use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    constants::MAX_FRAME_SIZE,
    world::{
        network_event::{RemoteEvent, WireEvent},
        object_kinds::ObjectKinds,
    },
};

use super::{
    compression_config::CompressionMode,
    decoder::Decoder,
    encoder::Encoder,
    error::{DecodeError, DecoderError, EncodeError, EncoderError},
};

/// bincode settings used for both frames & object snapshots. The size limit
/// keeps a hostile length prefix from triggering a huge allocation.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_FRAME_SIZE as u64)
}

pub(crate) fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, String> {
    wire_options().serialize(value).map_err(|err| err.to_string())
}

pub(crate) fn deserialize_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    wire_options().deserialize(bytes).map_err(|err| err.to_string())
}

/// Turns events into frames: one frame per event, one frame per datagram
pub struct FrameEncoder {
    encoder: Encoder,
}

impl FrameEncoder {
    pub fn try_new(compression_mode: Option<CompressionMode>) -> Result<Self, EncoderError> {
        Ok(Self {
            encoder: Encoder::try_new(compression_mode)?,
        })
    }

    pub fn encode(&mut self, event: &WireEvent) -> Result<Vec<u8>, EncodeError> {
        let payload = serialize_value(event)
            .map_err(|reason| EncodeError::SerializationFailed { reason })?;
        Ok(self.encoder.try_encode(&payload)?.to_vec())
    }
}

/// Turns received frames back into events
pub struct FrameDecoder {
    decoder: Decoder,
}

impl FrameDecoder {
    pub fn try_new(compression_mode: Option<CompressionMode>) -> Result<Self, DecoderError> {
        Ok(Self {
            decoder: Decoder::try_new(compression_mode)?,
        })
    }

    /// Decodes a frame into its wire form, object snapshots still opaque
    ///
    /// SECURITY: frames are untrusted; every failure is reported, never panics
    pub fn decode(&mut self, frame: &[u8]) -> Result<WireEvent, DecodeError> {
        if frame.is_empty() {
            return Err(DecodeError::EmptyFrame);
        }
        let payload = self.decoder.try_decode(frame)?;
        deserialize_value(payload).map_err(|reason| DecodeError::MalformedFrame {
            frame_size: frame.len(),
            reason,
        })
    }

    /// Decodes a frame and rebuilds any object it carries
    pub fn decode_remote(
        &mut self,
        frame: &[u8],
        object_kinds: &ObjectKinds,
    ) -> Result<RemoteEvent, DecodeError> {
        let event = self.decode(frame)?;
        Ok(event.into_remote(object_kinds)?)
    }
}
