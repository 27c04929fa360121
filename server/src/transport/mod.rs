pub mod udp;

pub use inner::{PacketReceiver, PacketSender, Socket};

mod inner {
    use scenecast_shared::TransportError;

    pub trait Socket {
        /// Splits the socket into its broadcast half & its control half
        fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
    }

    /// Delivers a frame to every subscriber the transport knows of
    pub trait PacketSender: Send + Sync {
        fn broadcast(&self, payload: &[u8]) -> Result<(), TransportError>;
    }

    /// Receives control frames from subscribers
    pub trait PacketReceiver: Send {
        /// Blocks for at most the transport's read timeout. `Ok(None)` means
        /// nothing arrived in time.
        fn receive(&mut self) -> Result<Option<&[u8]>, TransportError>;
    }
}
