use thiserror::Error;

use crate::world::error::ObjectKindsError;

/// Errors that can occur while compressing frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    /// Failed to create compressor with the specified configuration
    #[error("Failed to create compressor with compression level {level}")]
    CompressorCreationFailed {
        level: i32,
    },

    /// Failed to create compressor with dictionary
    #[error("Failed to create compressor with dictionary (compression level {level})")]
    CompressorWithDictionaryFailed {
        level: i32,
    },

    /// Compression operation failed
    #[error("Failed to compress payload of {payload_size} bytes")]
    CompressionFailed {
        payload_size: usize,
    },
}

/// Errors that can occur while decompressing frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// Failed to create decompressor
    #[error("Failed to create decompressor")]
    DecompressorCreationFailed,

    /// Failed to create decompressor with dictionary
    #[error("Failed to create decompressor with dictionary")]
    DecompressorWithDictionaryFailed,

    /// Decompression operation failed (SECURITY: potentially malicious payload)
    #[error("Failed to decompress payload of {payload_size} bytes (possible malformed or malicious data)")]
    DecompressionFailed {
        payload_size: usize,
    },
}

/// Errors that can occur while turning an event into a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Event could not be serialized
    #[error("Failed to serialize event: {reason}")]
    SerializationFailed { reason: String },

    /// Object snapshot could not be produced
    #[error("Failed to snapshot object: {0}")]
    Kind(#[from] ObjectKindsError),

    /// Compression error
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),
}

/// Errors that can occur while turning a received frame back into an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Zero-length frame
    #[error("Received an empty frame")]
    EmptyFrame,

    /// Frame bytes do not describe an event (SECURITY: potentially malicious frame)
    #[error("Malformed frame of {frame_size} bytes: {reason}")]
    MalformedFrame { frame_size: usize, reason: String },

    /// Object snapshot inside the frame could not be rebuilt
    #[error("Failed to rebuild object: {0}")]
    Kind(#[from] ObjectKindsError),

    /// Decompression error
    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),
}
