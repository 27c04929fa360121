//! # Scenecast Client
//! Subscribes to a scenecast publisher and keeps a local mirror of its scene
//! graph, tolerating frames that arrive late, twice, or not at all.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use scenecast_shared::{
        Classification, CompressionConfig, CompressionMode, LinkConditionerConfig, MirrorEvent,
        NetworkEvent, NetworkId, NetworkIdResolver, Protocol, RemoteEvent, Replicate, SceneMut,
        SceneRef, UpdateError,
    };
}

mod error;
mod subscriber;

pub use error::SubscriberError;
pub use subscriber::{subscriber::Subscriber, subscriber_config::SubscriberConfig};
