//! # Scenecast Server
//! Publishes a local scene graph to any number of subscribers over an
//! unordered, best-effort broadcast channel, and rebroadcasts the control
//! messages subscribers send back.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use scenecast_shared::{
        ChangeClock, ChangeMarker, Classification, CompressionConfig, CompressionMode,
        GraphIntegrityError, NetworkEvent, NetworkId, NetworkIdResolver, ObjectSnapshot, Protocol,
        Replicate, SceneMut, SceneRef, UpdateError, WireEvent,
    };
}

mod error;
mod publisher;

pub use error::PublisherError;
pub use publisher::{publisher::Publisher, publisher_config::PublisherConfig};
