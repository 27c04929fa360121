use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the Publisher
#[derive(Clone, Debug)]
pub struct PublisherConfig {
    /// How long the send loop blocks waiting for the next outbound event
    /// before re-checking whether it should stop
    pub event_queue_timeout: Duration,
    /// Pause after a failed control receive, so a broken socket cannot spin the loop
    pub control_error_backoff: Duration,
}

impl PublisherConfig {
    /// Bounded wait for the background loops to finish on shutdown
    pub fn shutdown_grace(&self) -> Duration {
        self.event_queue_timeout * 2
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            event_queue_timeout: Duration::from_millis(500),
            control_error_backoff: Duration::from_millis(50),
        }
    }
}
