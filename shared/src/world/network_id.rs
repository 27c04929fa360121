use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a replicated object, unique for the lifetime of one publisher
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(u32);

impl NetworkId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for NetworkId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Hands out identities starting at 1. Ids of removed objects are retired,
/// never recycled, so a late frame can never be mistaken for a newer object.
pub struct NetworkIdGenerator {
    next: u32,
}

impl Default for NetworkIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn generate(&mut self) -> NetworkId {
        let id = NetworkId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}
