/// Default port subscribers receive broadcast frames on
pub const DEFAULT_PUBLISH_PORT: u16 = 7777;
/// Default port the publisher listens for control frames on
pub const DEFAULT_CONTROL_PORT: u16 = 6666;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD_SIZE: usize = 65_507;
/// Upper bound on a decoded frame, guards deserialization of untrusted bytes
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;
/// Removed identities a subscriber remembers, so late events about them are ignored
pub const DEFAULT_TOMBSTONE_LIMIT: usize = 65_536;
