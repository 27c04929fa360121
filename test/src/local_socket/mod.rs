/// In-memory broadcast transport for E2E testing.
/// Routes frames between one publisher and any number of subscribers
/// without network I/O; one channel message carries exactly one frame.

use std::{
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex,
    },
    time::Duration,
};

use scenecast_client::transport::{
    PacketReceiver as SubscriberPacketReceiver, PacketSender as SubscriberPacketSender,
    Socket as SubscriberSocket,
};
use scenecast_server::transport::{
    PacketReceiver as PublisherPacketReceiver, PacketSender as PublisherPacketSender,
    Socket as PublisherSocket,
};
use scenecast_shared::TransportError;

const READ_TIMEOUT: Duration = Duration::from_millis(20);

type Inboxes = Arc<Mutex<Vec<Sender<Vec<u8>>>>>;

/// Hands out subscriber sockets wired to the publisher socket it was created with
#[derive(Clone)]
pub struct LocalHub {
    inboxes: Inboxes,
    control: Sender<Vec<u8>>,
}

impl LocalHub {
    pub fn open() -> (LocalPublisherSocket, LocalHub) {
        let inboxes: Inboxes = Arc::new(Mutex::new(Vec::new()));
        let (control, control_receiver) = mpsc::channel();
        let publisher = LocalPublisherSocket {
            inboxes: inboxes.clone(),
            control: control_receiver,
        };
        (publisher, LocalHub { inboxes, control })
    }

    /// A new subscriber socket. It receives every frame broadcast from now on.
    pub fn subscriber_socket(&self) -> LocalSubscriberSocket {
        let (inbox_sender, inbox) = mpsc::channel();
        lock(&self.inboxes).push(inbox_sender);
        LocalSubscriberSocket {
            control: self.control.clone(),
            inbox,
        }
    }

    /// Number of subscriber sockets still attached
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inboxes).len()
    }

    /// Deliver raw bytes to every attached subscriber, bypassing the publisher
    pub fn inject_broadcast(&self, frame: &[u8]) {
        lock(&self.inboxes).retain(|inbox| inbox.send(frame.to_vec()).is_ok());
    }

    /// Deliver raw bytes to the publisher's control socket
    pub fn inject_control(&self, frame: &[u8]) {
        self.control.send(frame.to_vec()).ok();
    }
}

fn lock(inboxes: &Inboxes) -> std::sync::MutexGuard<'_, Vec<Sender<Vec<u8>>>> {
    match inboxes.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn receive_into(
    channel: &Receiver<Vec<u8>>,
    buffer: &mut Vec<u8>,
) -> Result<bool, TransportError> {
    match channel.recv_timeout(READ_TIMEOUT) {
        Ok(frame) => {
            *buffer = frame;
            Ok(true)
        }
        Err(RecvTimeoutError::Timeout) => Ok(false),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
    }
}

// Publisher side

pub struct LocalPublisherSocket {
    inboxes: Inboxes,
    control: Receiver<Vec<u8>>,
}

impl PublisherSocket for LocalPublisherSocket {
    fn listen(
        self: Box<Self>,
    ) -> (Box<dyn PublisherPacketSender>, Box<dyn PublisherPacketReceiver>) {
        (
            Box::new(LocalBroadcaster {
                inboxes: self.inboxes,
            }),
            Box::new(LocalControlReceiver {
                control: self.control,
                buffer: Vec::new(),
            }),
        )
    }
}

impl From<LocalPublisherSocket> for Box<dyn PublisherSocket> {
    fn from(socket: LocalPublisherSocket) -> Self {
        Box::new(socket)
    }
}

struct LocalBroadcaster {
    inboxes: Inboxes,
}

impl PublisherPacketSender for LocalBroadcaster {
    fn broadcast(&self, payload: &[u8]) -> Result<(), TransportError> {
        // subscribers that went away are forgotten
        lock(&self.inboxes).retain(|inbox| inbox.send(payload.to_vec()).is_ok());
        Ok(())
    }
}

struct LocalControlReceiver {
    control: Receiver<Vec<u8>>,
    buffer: Vec<u8>,
}

impl PublisherPacketReceiver for LocalControlReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        if receive_into(&self.control, &mut self.buffer)? {
            Ok(Some(&self.buffer))
        } else {
            Ok(None)
        }
    }
}

// Subscriber side

pub struct LocalSubscriberSocket {
    control: Sender<Vec<u8>>,
    inbox: Receiver<Vec<u8>>,
}

impl SubscriberSocket for LocalSubscriberSocket {
    fn connect(
        self: Box<Self>,
    ) -> (Box<dyn SubscriberPacketSender>, Box<dyn SubscriberPacketReceiver>) {
        (
            Box::new(LocalControlSender {
                control: self.control,
            }),
            Box::new(LocalInbox {
                inbox: self.inbox,
                buffer: Vec::new(),
            }),
        )
    }
}

impl From<LocalSubscriberSocket> for Box<dyn SubscriberSocket> {
    fn from(socket: LocalSubscriberSocket) -> Self {
        Box::new(socket)
    }
}

struct LocalControlSender {
    control: Sender<Vec<u8>>,
}

impl SubscriberPacketSender for LocalControlSender {
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.control
            .send(payload.to_vec())
            .map_err(|_| TransportError::Disconnected)
    }
}

struct LocalInbox {
    inbox: Receiver<Vec<u8>>,
    buffer: Vec<u8>,
}

impl SubscriberPacketReceiver for LocalInbox {
    fn receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        if receive_into(&self.inbox, &mut self.buffer)? {
            Ok(Some(&self.buffer))
        } else {
            Ok(None)
        }
    }
}
