use scenecast_shared::{link_condition_logic, LinkConditionerConfig, TimeQueue, TransportError};

use super::PacketReceiver;

/// Used to receive frames through a simulated lossy, reordering network
pub struct ConditionedPacketReceiver {
    inner: Box<dyn PacketReceiver>,
    link_conditioner_config: LinkConditionerConfig,
    time_queue: TimeQueue<Vec<u8>>,
    last_payload: Option<Vec<u8>>,
}

impl ConditionedPacketReceiver {
    pub fn new(inner: Box<dyn PacketReceiver>, config: &LinkConditionerConfig) -> Self {
        Self {
            inner,
            link_conditioner_config: config.clone(),
            time_queue: TimeQueue::new(),
            last_payload: None,
        }
    }

    /// Frames accepted by the conditioner but not released yet
    pub fn in_flight(&self) -> usize {
        self.time_queue.len()
    }
}

impl PacketReceiver for ConditionedPacketReceiver {
    fn receive(&mut self) -> Result<Option<&[u8]>, TransportError> {
        loop {
            if self.time_queue.has_item() {
                self.last_payload = self.time_queue.pop_item();
                return Ok(self.last_payload.as_deref());
            }
            match self.inner.receive()? {
                Some(payload) => link_condition_logic::process_packet(
                    &self.link_conditioner_config,
                    &mut self.time_queue,
                    payload.to_vec(),
                ),
                None => return Ok(None),
            }
        }
    }
}
