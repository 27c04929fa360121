use std::{default::Default, time::Duration};

use scenecast_shared::DEFAULT_TOMBSTONE_LIMIT;

/// Contains Config properties which will be used by the Subscriber
#[derive(Clone, Debug)]
pub struct SubscriberConfig {
    /// How long after connecting the subscriber asks the publisher for a full
    /// resync. `None` disables the automatic request.
    pub initialization_delay: Option<Duration>,
    /// Upper bound on inbound events applied by one `network_update` call.
    /// `None` drains everything received so far.
    pub max_events_per_update: Option<usize>,
    /// Pause after a failed receive, so a broken socket cannot spin the loop
    pub receive_error_backoff: Duration,
    /// Bounded wait for the background threads to finish on `close`
    pub shutdown_timeout: Duration,
    /// How many removed identities the mirror remembers to reject late events
    pub tombstone_limit: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            initialization_delay: Some(Duration::from_secs(1)),
            max_events_per_update: None,
            receive_error_backoff: Duration::from_millis(50),
            shutdown_timeout: Duration::from_secs(1),
            tombstone_limit: DEFAULT_TOMBSTONE_LIMIT,
        }
    }
}
