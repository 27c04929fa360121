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

use log::{info, warn};

use scenecast_shared::{
    CompressionConfig, FrameDecoder, FrameEncoder, HostWorldManager, NetworkId, Protocol,
    PublishedObjects, SceneMut, SceneRef, WireEvent,
};

use super::{
    control_loop::ControlLoop,
    publisher_config::PublisherConfig,
    send_loop::{self, SendLoop},
};
use crate::{
    error::PublisherError,
    transport::{PacketSender, Socket},
};

/// Mirrors a local scene to every subscriber listening on the broadcast channel
pub struct Publisher<E: Copy + Eq + Hash> {
    config: PublisherConfig,
    compression: Option<CompressionConfig>,
    host_world: HostWorldManager<E>,
    published: PublishedObjects,
    queue_sender: Sender<WireEvent>,
    queue_receiver: Option<Receiver<WireEvent>>,
    packet_sender: Option<Arc<dyn PacketSender>>,
    publishing: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
    send_loop: Option<JoinHandle<Receiver<WireEvent>>>,
    control_loop: Option<JoinHandle<()>>,
}

impl<E: Copy + Eq + Hash> Publisher<E> {
    /// Create a new Publisher
    pub fn new<P: Into<Protocol>>(config: PublisherConfig, protocol: P) -> Self {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.lock();
        }
        let object_kinds = Arc::new(std::mem::take(&mut protocol.object_kinds));

        let (queue_sender, queue_receiver) = mpsc::channel();
        let published = PublishedObjects::new();
        let host_world = HostWorldManager::new(object_kinds, published.clone(), queue_sender.clone());

        Self {
            config,
            compression: protocol.compression.clone(),
            host_world,
            published,
            queue_sender,
            queue_receiver: Some(queue_receiver),
            packet_sender: None,
            publishing: Arc::new(AtomicBool::new(false)),
            listening: Arc::new(AtomicBool::new(false)),
            send_loop: None,
            control_loop: None,
        }
    }

    /// Take ownership of a socket and start receiving control frames from subscribers
    pub fn listen<S: Into<Box<dyn Socket>>>(&mut self, socket: S) -> Result<(), PublisherError> {
        if self.packet_sender.is_some() {
            return Err(PublisherError::AlreadyListening);
        }

        let (packet_sender, packet_receiver) = socket.into().listen();
        let decoder = FrameDecoder::try_new(
            self.compression
                .as_ref()
                .and_then(|config| config.control_mode.clone()),
        )?;

        self.listening.store(true, Ordering::SeqCst);
        let control_loop = ControlLoop {
            running: self.listening.clone(),
            receiver: packet_receiver,
            decoder,
            requeue: self.queue_sender.clone(),
            error_backoff: self.config.control_error_backoff,
        };
        let handle = thread::Builder::new()
            .name("scenecast-control".to_string())
            .spawn(move || {
                control_loop.run();
            })
            .map_err(|err| {
                self.listening.store(false, Ordering::SeqCst);
                PublisherError::ThreadSpawn {
                    name: "control",
                    reason: err.to_string(),
                }
            })?;

        self.control_loop = Some(handle);
        self.packet_sender = Some(Arc::from(packet_sender));
        info!("Publisher listening");
        Ok(())
    }

    /// Start draining the outbound queue onto the broadcast channel
    pub fn start_publishing(&mut self) -> Result<(), PublisherError> {
        let packet_sender = self
            .packet_sender
            .clone()
            .ok_or(PublisherError::NotListening)?;
        if self.send_loop.is_some() {
            return Err(PublisherError::AlreadyPublishing);
        }
        let queue = self
            .queue_receiver
            .take()
            .ok_or(PublisherError::AlreadyPublishing)?;

        let encoder = match FrameEncoder::try_new(
            self.compression
                .as_ref()
                .and_then(|config| config.publish_mode.clone()),
        ) {
            Ok(encoder) => encoder,
            Err(err) => {
                self.queue_receiver = Some(queue);
                return Err(err.into());
            }
        };

        self.publishing.store(true, Ordering::SeqCst);
        let send_loop = SendLoop {
            running: self.publishing.clone(),
            queue,
            requeue: self.queue_sender.clone(),
            published: self.published.clone(),
            sender: packet_sender,
            encoder,
            poll_timeout: self.config.event_queue_timeout,
        };
        let handle = thread::Builder::new()
            .name("scenecast-send".to_string())
            .spawn(move || send_loop.run())
            .map_err(|err| {
                self.publishing.store(false, Ordering::SeqCst);
                PublisherError::ThreadSpawn {
                    name: "send",
                    reason: err.to_string(),
                }
            })?;
        self.send_loop = Some(handle);
        info!("Publisher started");
        Ok(())
    }

    /// Stop the send loop, waiting at most the shutdown grace for it to exit.
    /// Events still queued stay queued for the next start.
    pub fn stop_publishing(&mut self) {
        self.publishing.store(false, Ordering::SeqCst);
        let Some(handle) = self.send_loop.take() else {
            return;
        };
        match join_within(handle, self.config.shutdown_grace()) {
            Some(queue) => self.queue_receiver = Some(queue),
            None => warn!("Send loop did not stop in time, outbound queue abandoned"),
        }
        info!("Publisher stopped");
    }

    /// Stop both background loops and release the socket
    pub fn close(&mut self) {
        self.stop_publishing();
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.control_loop.take() {
            if join_within(handle, self.config.shutdown_grace()).is_none() {
                warn!("Control loop did not stop in time");
            }
        }
        self.packet_sender = None;
    }

    pub fn is_publishing(&self) -> bool {
        self.send_loop.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.packet_sender.is_some()
    }

    // Scene

    /// Register the scene root and everything reachable from it. Registering
    /// the same root twice is a no-op.
    pub fn register<W: SceneMut<E>>(&mut self, world: &mut W) -> Result<NetworkId, PublisherError> {
        Ok(self.host_world.register(world)?)
    }

    /// Register one node under an already registered parent
    pub fn register_node<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        handle: &E,
    ) -> Result<NetworkId, PublisherError> {
        Ok(self.host_world.register_node(world, handle)?)
    }

    /// Queue events for every structural and value change since the last scan
    pub fn scan_for_changes<W: SceneMut<E>>(&mut self, world: &mut W) -> Result<(), PublisherError> {
        Ok(self.host_world.scan_for_changes(world)?)
    }

    /// Announce removal of `handle` and its registered descendants
    pub fn remove_node<W: SceneRef<E>>(
        &mut self,
        world: &W,
        handle: &E,
    ) -> Result<Vec<NetworkId>, PublisherError> {
        Ok(self.host_world.remove_node(world, handle)?)
    }

    pub fn network_id(&self, handle: &E) -> Option<NetworkId> {
        self.host_world.network_id(handle)
    }

    pub fn registered_count(&self) -> usize {
        self.host_world.registered_count()
    }

    pub fn published_objects(&self) -> &PublishedObjects {
        &self.published
    }

    /// Queue an event as if it had arrived on the control channel
    pub fn enqueue(&self, event: WireEvent) {
        if self.queue_sender.send(event).is_err() {
            warn!("Outbound queue closed, event dropped");
        }
    }

    /// Run the outbound queue to completion without a network, returning what
    /// would have been broadcast. Not available while the send loop runs.
    pub fn drain_events(&mut self) -> Result<Vec<WireEvent>, PublisherError> {
        let queue = self
            .queue_receiver
            .as_ref()
            .ok_or(PublisherError::AlreadyPublishing)?;

        let mut drained = Vec::new();
        while let Ok(event) = queue.try_recv() {
            if let Some(event) = send_loop::resolve(event, &self.published, &self.queue_sender) {
                drained.push(event);
            }
        }
        Ok(drained)
    }
}

impl<E: Copy + Eq + Hash> Drop for Publisher<E> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Join `handle` if it finishes within `grace`, otherwise leave it detached
fn join_within<T>(handle: JoinHandle<T>, grace: Duration) -> Option<T> {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(5));
    }
    handle.join().ok()
}
