pub mod udp;

mod conditioner;

pub use conditioner::ConditionedPacketReceiver;
pub use inner::{PacketReceiver, PacketSender, Socket};

mod inner {
    use scenecast_shared::TransportError;

    pub trait Socket {
        /// Splits the socket into its control half & its broadcast half
        fn connect(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>);
    }

    /// Sends control frames to the publisher
    pub trait PacketSender: Send + Sync {
        fn send(&self, payload: &[u8]) -> Result<(), TransportError>;
    }

    /// Receives broadcast frames from the publisher
    pub trait PacketReceiver: Send {
        /// Blocks for at most the transport's read timeout. `Ok(None)` means
        /// nothing arrived in time.
        fn receive(&mut self) -> Result<Option<&[u8]>, TransportError>;
    }
}
