use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread,
    time::Duration,
};

use log::{debug, trace, warn};

use scenecast_shared::{ChangeClock, FrameDecoder, NetworkEvent, WireEvent};

use crate::transport::PacketReceiver;

/// Feeds every control frame from subscribers into the outbound queue, so
/// `RequestInitialization` and relation edits reach the send loop like any
/// locally produced event.
pub(crate) struct ControlLoop {
    pub running: Arc<AtomicBool>,
    pub receiver: Box<dyn PacketReceiver>,
    pub decoder: FrameDecoder,
    pub requeue: Sender<WireEvent>,
    pub error_backoff: Duration,
}

impl ControlLoop {
    pub fn run(mut self) {
        debug!("Control loop started");
        while self.running.load(Ordering::SeqCst) {
            match self.receiver.receive() {
                Ok(Some([])) => trace!("Subscriber announced itself"),
                Ok(Some(frame)) => match self.decoder.decode(frame) {
                    Ok(event) => {
                        if self.requeue.send(restamp(event)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("Dropping malformed control frame: {}", err),
                },
                Ok(None) => {}
                Err(err) => {
                    warn!("Control receive failed: {}", err);
                    thread::sleep(self.error_backoff);
                }
            }
        }
        debug!("Control loop stopped");
    }
}

/// Relation edits from subscribers are ordered against the publisher's own
/// events by stamping them on arrival
fn restamp(event: WireEvent) -> WireEvent {
    match event {
        NetworkEvent::NewRelation { parent, child, .. } => NetworkEvent::NewRelation {
            parent,
            child,
            stamp: ChangeClock::tick(),
        },
        NetworkEvent::RemoveRelation { parent, child, .. } => NetworkEvent::RemoveRelation {
            parent,
            child,
            stamp: ChangeClock::tick(),
        },
        other => other,
    }
}
