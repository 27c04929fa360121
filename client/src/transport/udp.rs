use std::{
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    time::Duration,
};

use log::{info, warn};

use scenecast_shared::{TransportError, DEFAULT_CONTROL_PORT, MAX_UDP_PAYLOAD_SIZE};

use super::{PacketReceiver, PacketSender, Socket as TransportSocket};

/// Default time a receive blocks before reporting that nothing arrived
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// UDP transport. Control frames go to the publisher's control address, and
/// broadcast frames are read from whatever address they come from.
pub struct Socket {
    socket: UdpSocket,
    publisher_control_addr: SocketAddr,
}

impl Socket {
    /// Bind `local_addr` and target the publisher's control socket
    pub fn bind(
        local_addr: SocketAddr,
        publisher_control_addr: SocketAddr,
        read_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(local_addr).map_err(|err| TransportError::BindFailed {
            address: local_addr,
            reason: err.to_string(),
        })?;
        socket
            .set_read_timeout(Some(read_timeout))
            .map_err(|err| TransportError::ConfigureFailed {
                address: local_addr,
                reason: err.to_string(),
            })?;

        Ok(Self {
            socket,
            publisher_control_addr,
        })
    }

    /// Any local port, publisher on this machine at its default control port
    pub fn localhost() -> Result<Self, TransportError> {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        Self::bind(
            SocketAddr::new(localhost, 0),
            SocketAddr::new(localhost, DEFAULT_CONTROL_PORT),
            DEFAULT_READ_TIMEOUT,
        )
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket
            .local_addr()
            .map_err(|err| TransportError::ReceiveFailed {
                reason: err.to_string(),
            })
    }
}

impl TransportSocket for Socket {
    fn connect(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
        let sender = UdpPacketSender {
            socket: self.socket.try_clone().ok(),
            publisher_control_addr: self.publisher_control_addr,
        };
        if sender.socket.is_none() {
            warn!("Could not clone the UDP socket, control frames will not be sent");
        }

        // an empty frame announces this address as a broadcast target
        match sender.send(&[]) {
            Ok(()) => info!("Announced to publisher at {}", self.publisher_control_addr),
            Err(err) => warn!("Could not announce to publisher: {}", err),
        }

        let receiver = UdpPacketReceiver {
            socket: self.socket,
            buffer: vec![0; MAX_UDP_PAYLOAD_SIZE],
        };
        (Box::new(sender), Box::new(receiver))
    }
}

impl From<Socket> for Box<dyn TransportSocket> {
    fn from(socket: Socket) -> Self {
        Box::new(socket)
    }
}

struct UdpPacketSender {
    socket: Option<UdpSocket>,
    publisher_control_addr: SocketAddr,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > MAX_UDP_PAYLOAD_SIZE {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_UDP_PAYLOAD_SIZE,
            });
        }
        let socket = self.socket.as_ref().ok_or(TransportError::Disconnected)?;
        socket
            .send_to(payload, self.publisher_control_addr)
            .map(|_| ())
            .map_err(|err| TransportError::SendFailed {
                address: self.publisher_control_addr.to_string(),
                size: payload.len(),
                reason: err.to_string(),
            })
    }
}

struct UdpPacketReceiver {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, _)) => Ok(Some(&self.buffer[..length])),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(err) => Err(TransportError::ReceiveFailed {
                reason: err.to_string(),
            }),
        }
    }
}
