use std::{
    collections::HashSet,
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::{info, warn};

use scenecast_shared::{
    TransportError, DEFAULT_CONTROL_PORT, DEFAULT_PUBLISH_PORT, MAX_UDP_PAYLOAD_SIZE,
};

use super::{PacketReceiver, PacketSender, Socket as TransportSocket};

/// Addresses the publisher binds
#[derive(Clone, Debug)]
pub struct PublisherAddrs {
    /// Source of broadcast frames
    pub publish_addr: SocketAddr,
    /// Where subscribers send control frames
    pub control_addr: SocketAddr,
}

impl PublisherAddrs {
    pub fn new(publish_addr: SocketAddr, control_addr: SocketAddr) -> Self {
        Self {
            publish_addr,
            control_addr,
        }
    }

    /// Both sockets on loopback with OS-assigned ports
    pub fn loopback() -> Self {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        Self::new(SocketAddr::new(localhost, 0), SocketAddr::new(localhost, 0))
    }
}

impl Default for PublisherAddrs {
    fn default() -> Self {
        let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        Self::new(
            SocketAddr::new(any, DEFAULT_PUBLISH_PORT),
            SocketAddr::new(any, DEFAULT_CONTROL_PORT),
        )
    }
}

type Subscribers = Arc<Mutex<HashSet<SocketAddr>>>;

fn lock(subscribers: &Subscribers) -> MutexGuard<'_, HashSet<SocketAddr>> {
    match subscribers.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// UDP transport. Every address a control frame arrives from becomes a
/// broadcast target; one datagram carries exactly one frame.
pub struct Socket {
    publish_socket: UdpSocket,
    control_socket: UdpSocket,
    subscribers: Subscribers,
}

impl Socket {
    pub fn bind(addrs: &PublisherAddrs, read_timeout: Duration) -> Result<Self, TransportError> {
        let publish_socket = bind_with_fallback(addrs.publish_addr)?;
        let control_socket = bind_with_fallback(addrs.control_addr)?;
        control_socket
            .set_read_timeout(Some(read_timeout))
            .map_err(|err| TransportError::ConfigureFailed {
                address: addrs.control_addr,
                reason: err.to_string(),
            })?;

        Ok(Self {
            publish_socket,
            control_socket,
            subscribers: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn publish_addr(&self) -> Result<SocketAddr, TransportError> {
        local_addr(&self.publish_socket)
    }

    pub fn control_addr(&self) -> Result<SocketAddr, TransportError> {
        local_addr(&self.control_socket)
    }

    /// Add a broadcast target without waiting for it to send a control frame
    pub fn add_subscriber(&self, address: SocketAddr) {
        lock(&self.subscribers).insert(address);
    }
}

impl TransportSocket for Socket {
    fn listen(self: Box<Self>) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
        let sender = UdpPacketSender {
            socket: self.publish_socket,
            subscribers: self.subscribers.clone(),
        };
        let receiver = UdpPacketReceiver {
            socket: self.control_socket,
            subscribers: self.subscribers,
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

fn bind_with_fallback(address: SocketAddr) -> Result<UdpSocket, TransportError> {
    match UdpSocket::bind(address) {
        Ok(socket) => Ok(socket),
        Err(err) => {
            warn!("Binding {} failed ({}), trying a random port", address, err);
            let fallback = SocketAddr::new(address.ip(), 0);
            let socket = UdpSocket::bind(fallback).map_err(|err| TransportError::BindFailed {
                address,
                reason: err.to_string(),
            })?;
            if let Ok(bound) = socket.local_addr() {
                info!("Bound {} instead of {}", bound, address);
            }
            Ok(socket)
        }
    }
}

fn local_addr(socket: &UdpSocket) -> Result<SocketAddr, TransportError> {
    socket
        .local_addr()
        .map_err(|err| TransportError::ReceiveFailed {
            reason: err.to_string(),
        })
}

struct UdpPacketSender {
    socket: UdpSocket,
    subscribers: Subscribers,
}

impl PacketSender for UdpPacketSender {
    fn broadcast(&self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > MAX_UDP_PAYLOAD_SIZE {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_UDP_PAYLOAD_SIZE,
            });
        }

        let targets: Vec<SocketAddr> = lock(&self.subscribers).iter().copied().collect();
        let mut first_error = None;
        for address in targets {
            if let Err(err) = self.socket.send_to(payload, address) {
                first_error.get_or_insert(TransportError::SendFailed {
                    address: address.to_string(),
                    size: payload.len(),
                    reason: err.to_string(),
                });
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct UdpPacketReceiver {
    socket: UdpSocket,
    subscribers: Subscribers,
    buffer: Vec<u8>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => {
                if lock(&self.subscribers).insert(address) {
                    info!("Subscriber {} joined", address);
                }
                Ok(Some(&self.buffer[..length]))
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(err) => Err(TransportError::ReceiveFailed {
                reason: err.to_string(),
            }),
        }
    }
}
