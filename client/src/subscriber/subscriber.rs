use std::{
    hash::Hash,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use scenecast_shared::{
    CompressionConfig, FrameDecoder, FrameEncoder, LinkConditionerConfig, MirrorEvent,
    NetworkEvent, NetworkId, ObjectKinds, Protocol, RemoteEvent, RemoteWorldManager, SceneMut,
    WireEvent,
};

use super::{receive_loop::ReceiveLoop, subscriber_config::SubscriberConfig};
use crate::{
    error::SubscriberError,
    transport::{ConditionedPacketReceiver, PacketReceiver, PacketSender, Socket},
};

/// Maintains a local mirror of a publisher's scene
pub struct Subscriber<E: Copy + Eq + Hash> {
    config: SubscriberConfig,
    object_kinds: Arc<ObjectKinds>,
    compression: Option<CompressionConfig>,
    link_condition: Option<LinkConditionerConfig>,
    remote_world: RemoteWorldManager<E>,
    inbound_sender: Sender<RemoteEvent>,
    inbound_receiver: Receiver<RemoteEvent>,
    control_encoder: Option<FrameEncoder>,
    packet_sender: Option<Arc<dyn PacketSender>>,
    running: Arc<AtomicBool>,
    receive_loop: Option<JoinHandle<()>>,
    initialization_timer: Option<JoinHandle<()>>,
}

impl<E: Copy + Eq + Hash> Subscriber<E> {
    /// Create a new Subscriber
    pub fn new<P: Into<Protocol>>(config: SubscriberConfig, protocol: P) -> Self {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.lock();
        }
        let object_kinds = Arc::new(std::mem::take(&mut protocol.object_kinds));
        let (inbound_sender, inbound_receiver) = mpsc::channel();
        let remote_world = RemoteWorldManager::with_tombstone_limit(config.tombstone_limit);

        Self {
            config,
            object_kinds,
            compression: protocol.compression.clone(),
            link_condition: protocol.link_condition.clone(),
            remote_world,
            inbound_sender,
            inbound_receiver,
            control_encoder: None,
            packet_sender: None,
            running: Arc::new(AtomicBool::new(false)),
            receive_loop: None,
            initialization_timer: None,
        }
    }

    /// Take ownership of a socket, start receiving broadcast frames and
    /// schedule the initial resync request
    pub fn connect<S: Into<Box<dyn Socket>>>(&mut self, socket: S) -> Result<(), SubscriberError> {
        if self.packet_sender.is_some() {
            return Err(SubscriberError::AlreadyConnected);
        }

        let decoder = FrameDecoder::try_new(
            self.compression
                .as_ref()
                .and_then(|config| config.publish_mode.clone()),
        )?;
        let mut control_encoder = FrameEncoder::try_new(
            self.compression
                .as_ref()
                .and_then(|config| config.control_mode.clone()),
        )?;
        let initialization_frame = control_encoder.encode(&NetworkEvent::RequestInitialization)?;

        let (packet_sender, packet_receiver) = socket.into().connect();
        let packet_sender: Arc<dyn PacketSender> = Arc::from(packet_sender);
        let packet_receiver: Box<dyn PacketReceiver> = match &self.link_condition {
            Some(config) => Box::new(ConditionedPacketReceiver::new(packet_receiver, config)),
            None => packet_receiver,
        };

        self.running.store(true, Ordering::SeqCst);
        let receive_loop = ReceiveLoop {
            running: self.running.clone(),
            receiver: packet_receiver,
            decoder,
            object_kinds: self.object_kinds.clone(),
            inbound: self.inbound_sender.clone(),
            error_backoff: self.config.receive_error_backoff,
        };
        let handle = thread::Builder::new()
            .name("scenecast-receive".to_string())
            .spawn(move || receive_loop.run())
            .map_err(|err| {
                self.running.store(false, Ordering::SeqCst);
                SubscriberError::ThreadSpawn {
                    name: "receive",
                    reason: err.to_string(),
                }
            })?;
        self.receive_loop = Some(handle);

        if let Some(delay) = self.config.initialization_delay {
            let running = self.running.clone();
            let sender = packet_sender.clone();
            let timer = thread::Builder::new()
                .name("scenecast-initialization".to_string())
                .spawn(move || {
                    if sleep_while_running(&running, delay) {
                        debug!("Requesting initialization");
                        if let Err(err) = sender.send(&initialization_frame) {
                            warn!("Initialization request failed: {}", err);
                        }
                    }
                });
            match timer {
                Ok(timer) => self.initialization_timer = Some(timer),
                Err(err) => warn!("Could not schedule initialization request: {}", err),
            }
        }

        self.control_encoder = Some(control_encoder);
        self.packet_sender = Some(packet_sender);
        info!("Subscriber connected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.packet_sender.is_some()
    }

    /// Ask the publisher to rebroadcast the current state of every object
    pub fn request_initialization(&mut self) -> Result<(), SubscriberError> {
        self.send_control(&NetworkEvent::RequestInitialization)
    }

    /// Ask the publisher to reparent `child`, or to detach it when `parent`
    /// is `None`. The change reaches this mirror through the broadcast like
    /// any other.
    pub fn send_relation(
        &mut self,
        parent: Option<NetworkId>,
        child: NetworkId,
    ) -> Result<(), SubscriberError> {
        self.send_control(&NetworkEvent::NewRelation {
            parent,
            child,
            stamp: 0,
        })
    }

    /// Ask the publisher to remove one `parent` of `child`
    pub fn send_remove_relation(
        &mut self,
        parent: NetworkId,
        child: NetworkId,
    ) -> Result<(), SubscriberError> {
        self.send_control(&NetworkEvent::RemoveRelation {
            parent,
            child,
            stamp: 0,
        })
    }

    fn send_control(&mut self, event: &WireEvent) -> Result<(), SubscriberError> {
        let (Some(encoder), Some(sender)) = (self.control_encoder.as_mut(), &self.packet_sender)
        else {
            return Err(SubscriberError::NotConnected);
        };
        let frame = encoder.encode(event)?;
        sender.send(&frame)?;
        Ok(())
    }

    /// Apply everything received since the last call to the mirror, in
    /// receipt order, and report what changed
    pub fn network_update<W: SceneMut<E>>(&mut self, world: &mut W) -> Vec<MirrorEvent> {
        let limit = self.config.max_events_per_update.unwrap_or(usize::MAX);
        let events: Vec<RemoteEvent> = self.inbound_receiver.try_iter().take(limit).collect();
        if !events.is_empty() {
            debug!("Applying {} remote events", events.len());
        }
        self.remote_world.process_events(world, events)
    }

    /// Apply events that did not come through the socket
    pub fn process_events<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        events: impl IntoIterator<Item = RemoteEvent>,
    ) -> Vec<MirrorEvent> {
        self.remote_world.process_events(world, events)
    }

    pub fn network_id(&self, handle: &E) -> Option<NetworkId> {
        self.remote_world.network_id(handle)
    }

    pub fn handle(&self, network_id: &NetworkId) -> Option<E> {
        self.remote_world.handle(network_id)
    }

    /// Number of objects mirrored so far
    pub fn known_count(&self) -> usize {
        self.remote_world.known_count()
    }

    /// Number of events parked on identities not seen yet
    pub fn waiting_count(&self) -> usize {
        self.remote_world.waitlist().len()
    }

    pub fn remote_world(&self) -> &RemoteWorldManager<E> {
        &self.remote_world
    }

    pub fn object_kinds(&self) -> &ObjectKinds {
        &self.object_kinds
    }

    /// Stop the background threads, waiting at most `shutdown_timeout`.
    /// The mirror is kept.
    pub fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let deadline = Instant::now() + self.config.shutdown_timeout;
        for handle in [self.receive_loop.take(), self.initialization_timer.take()]
            .into_iter()
            .flatten()
        {
            if !join_until(handle, deadline) {
                warn!("Subscriber thread did not stop in time");
            }
        }
        if self.packet_sender.take().is_some() {
            info!("Subscriber closed");
        }
        self.control_encoder = None;
    }
}

impl<E: Copy + Eq + Hash> Drop for Subscriber<E> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sleep for `duration` in short steps. Returns false if told to stop first.
fn sleep_while_running(running: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(10)));
    }
}

fn join_until(handle: JoinHandle<()>, deadline: Instant) -> bool {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    handle.join().is_ok()
}
