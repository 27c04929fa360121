pub mod compression_config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame_codec;
