use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    time::Duration,
};

use log::{debug, trace, warn};

use scenecast_shared::{FrameEncoder, NetworkEvent, PublishedObjects, WireEvent};

use crate::transport::PacketSender;

/// `RequestInitialization` turns into one `Update` per known object, queued
/// behind whatever is already waiting. Anything else is passed through.
pub(crate) fn resolve(
    event: WireEvent,
    published: &PublishedObjects,
    requeue: &Sender<WireEvent>,
) -> Option<WireEvent> {
    if let NetworkEvent::RequestInitialization = event {
        let updates = published.initialization_events();
        debug!("Initialization requested, queueing {} updates", updates.len());
        for update in updates {
            if requeue.send(update).is_err() {
                break;
            }
        }
        return None;
    }
    Some(event)
}

/// Drains the outbound queue onto the broadcast channel until told to stop.
/// Hands the queue back when it exits so publishing can resume later.
pub(crate) struct SendLoop {
    pub running: Arc<AtomicBool>,
    pub queue: Receiver<WireEvent>,
    pub requeue: Sender<WireEvent>,
    pub published: PublishedObjects,
    pub sender: Arc<dyn PacketSender>,
    pub encoder: FrameEncoder,
    pub poll_timeout: Duration,
}

impl SendLoop {
    pub fn run(mut self) -> Receiver<WireEvent> {
        debug!("Send loop started");
        while self.running.load(Ordering::SeqCst) {
            let event = match self.queue.recv_timeout(self.poll_timeout) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let Some(event) = resolve(event, &self.published, &self.requeue) else {
                continue;
            };
            self.publish(&event);
        }
        debug!("Send loop stopped");
        self.queue
    }

    /// Failures are logged and the event dropped, the next resync repairs it
    fn publish(&mut self, event: &WireEvent) {
        let frame = match self.encoder.encode(event) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Dropping event, encoding failed: {}", err);
                return;
            }
        };
        match self.sender.broadcast(&frame) {
            Ok(()) => trace!("Broadcast {} byte frame", frame.len()),
            Err(err) => warn!("Dropping event, broadcast failed: {}", err),
        }
    }
}
