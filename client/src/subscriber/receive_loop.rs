use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread,
    time::Duration,
};

use log::{debug, warn};

use scenecast_shared::{FrameDecoder, ObjectKinds, RemoteEvent};

use crate::transport::PacketReceiver;

/// Decodes every broadcast frame and hands the event to the caller's thread.
/// Nothing here touches the mirror.
pub(crate) struct ReceiveLoop {
    pub running: Arc<AtomicBool>,
    pub receiver: Box<dyn PacketReceiver>,
    pub decoder: FrameDecoder,
    pub object_kinds: Arc<ObjectKinds>,
    pub inbound: Sender<RemoteEvent>,
    pub error_backoff: Duration,
}

impl ReceiveLoop {
    pub fn run(mut self) {
        debug!("Receive loop started");
        while self.running.load(Ordering::SeqCst) {
            match self.receiver.receive() {
                Ok(Some(frame)) => match self.decoder.decode_remote(frame, &self.object_kinds) {
                    Ok(event) => {
                        if self.inbound.send(event).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("Dropping malformed frame: {}", err),
                },
                Ok(None) => {}
                Err(err) => {
                    warn!("Receive failed: {}", err);
                    thread::sleep(self.error_backoff);
                }
            }
        }
        debug!("Receive loop stopped");
    }
}
