/// Compression applied to every frame after serialization.
/// Publisher & subscriber must be configured identically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub publish_mode: Option<CompressionMode>,
    pub control_mode: Option<CompressionMode>,
}

impl CompressionConfig {
    pub fn new(publish_mode: Option<CompressionMode>, control_mode: Option<CompressionMode>) -> Self {
        Self {
            publish_mode,
            control_mode,
        }
    }

    /// Same mode on both the broadcast and the control channel
    pub fn symmetric(mode: CompressionMode) -> Self {
        Self::new(Some(mode.clone()), Some(mode))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompressionMode {
    /// Compression mode using default zstd dictionary.
    /// 1st i32 parameter here is the compression level from -7 (fastest) to 22
    /// (smallest).
    Default(i32),
    /// Compression mode using custom dictionary.
    /// 1st i32 parameter here is the compression level from -7 (fastest) to 22
    /// (smallest). 2nd `Vec<u8>` parameter here is the dictionary itself.
    Dictionary(i32, Vec<u8>),
}
