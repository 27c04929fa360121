use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while moving frames across a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Neither the configured address nor a fallback port could be bound
    #[error("Failed to bind socket at {address}: {reason}")]
    BindFailed { address: SocketAddr, reason: String },

    /// Socket option could not be applied
    #[error("Failed to configure socket at {address}: {reason}")]
    ConfigureFailed { address: SocketAddr, reason: String },

    /// Frame exceeds what one datagram can carry
    #[error("Frame of {size} bytes exceeds the {limit} byte datagram limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Underlying send failed
    #[error("Failed to send {size} byte frame to {address}: {reason}")]
    SendFailed {
        address: String,
        size: usize,
        reason: String,
    },

    /// Underlying receive failed
    #[error("Failed to receive frame: {reason}")]
    ReceiveFailed { reason: String },

    /// The other half of an in-process channel has gone away
    #[error("Transport channel disconnected")]
    Disconnected,
}
