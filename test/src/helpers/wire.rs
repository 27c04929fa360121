use std::{
    thread,
    time::{Duration, Instant},
};

use scenecast_shared::{ObjectKinds, RemoteEvent, WireEvent};

use crate::test_protocol::protocol;

/// The object kinds of the test protocol
pub fn kinds() -> ObjectKinds {
    protocol().object_kinds
}

/// Rebuild drained publisher events the way a subscriber's receive loop would
pub fn to_remote(events: Vec<WireEvent>, kinds: &ObjectKinds) -> Vec<RemoteEvent> {
    events
        .into_iter()
        .map(|event| event.into_remote(kinds).expect("test kinds decode"))
        .collect()
}

/// Poll `condition` until it holds or `timeout` passes. Returns the final outcome.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
}
