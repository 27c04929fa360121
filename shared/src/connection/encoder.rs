cfg_if! {
    if #[cfg(feature = "zstd_support")]
    {
        use zstd::bulk::Compressor;

        use super::compression_config::CompressionMode;
        use super::error::EncoderError;

        pub struct Encoder {
            result: Vec<u8>,
            compressor: Option<Compressor<'static>>,
        }

        impl Encoder {
            /// Try to create a new Encoder, `None` disables compression
            pub fn try_new(compression_mode: Option<CompressionMode>) -> Result<Self, EncoderError> {
                let compressor = match compression_mode {
                    None => None,
                    Some(CompressionMode::Default(compression_level)) => Some(
                        Compressor::new(compression_level).map_err(|_| EncoderError::CompressorCreationFailed {
                            level: compression_level,
                        })?,
                    ),
                    Some(CompressionMode::Dictionary(compression_level, dictionary)) => Some(
                        Compressor::with_dictionary(compression_level, &dictionary)
                            .map_err(|_| EncoderError::CompressorWithDictionaryFailed {
                                level: compression_level,
                            })?,
                    ),
                };

                Ok(Self {
                    result: Vec::new(),
                    compressor,
                })
            }

            /// Try to encode a payload, returning error on compression failure
            pub fn try_encode(&mut self, payload: &[u8]) -> Result<&[u8], EncoderError> {
                match &mut self.compressor {
                    Some(compressor) => {
                        self.result = compressor.compress(payload).map_err(|_| EncoderError::CompressionFailed {
                            payload_size: payload.len(),
                        })?;
                    }
                    None => {
                        self.result = payload.to_vec();
                    }
                }
                Ok(&self.result)
            }
        }
    }
    else
    {
        use log::warn;

        use super::compression_config::CompressionMode;
        use super::error::EncoderError;

        pub struct Encoder {
            result: Vec<u8>
        }

        impl Encoder {
            pub fn try_new(compression_mode: Option<CompressionMode>) -> Result<Self, EncoderError> {
                if compression_mode.is_some() {
                    warn!("Compression requested but the `zstd_support` feature is disabled, frames will be sent uncompressed");
                }
                Ok(Self {
                    result: Vec::new(),
                })
            }

            pub fn try_encode(&mut self, payload: &[u8]) -> Result<&[u8], EncoderError> {
                self.result = payload.to_vec();
                Ok(&self.result)
            }
        }
    }
}
