//! # Scenecast Shared
//! Common functionality shared between scenecast-server & scenecast-client crates:
//! identities, the replication event model, the frame codec and the host / remote
//! world managers that drive publishing and mirroring.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod connection;
mod constants;
mod link_conditioner;
mod protocol;
mod transport;
mod types;
mod world;

pub use connection::{
    compression_config::{CompressionConfig, CompressionMode},
    decoder::Decoder,
    encoder::Encoder,
    error::{DecodeError, DecoderError, EncodeError, EncoderError},
    frame_codec::{FrameDecoder, FrameEncoder},
};
pub use constants::{
    DEFAULT_CONTROL_PORT, DEFAULT_PUBLISH_PORT, DEFAULT_TOMBSTONE_LIMIT, MAX_FRAME_SIZE,
    MAX_UDP_PAYLOAD_SIZE,
};
pub use link_conditioner::{link_condition_logic, LinkConditionerConfig, TimeQueue};
pub use protocol::{Protocol, ProtocolError};
pub use transport::error::TransportError;
pub use types::{KindId, Stamp};
pub use world::{
    change_clock::{ChangeClock, ChangeMarker},
    host::{
        error::GraphIntegrityError,
        host_world_manager::HostWorldManager,
        published_objects::PublishedObjects,
    },
    network_event::{NetworkEvent, RemoteEvent, WireEvent},
    network_id::{NetworkId, NetworkIdGenerator},
    network_wrapper::NetworkWrapper,
    object_kinds::{ObjectKind, ObjectKinds, ObjectSnapshot},
    error::ObjectKindsError,
    remote::{
        error::RemoteWorldError,
        mirror_event::MirrorEvent,
        network_id_map::NetworkIdMap,
        network_waitlist::{NetworkWaitlist, Parked, WaitReason},
        remote_world_manager::RemoteWorldManager,
        tombstones::Tombstones,
    },
    replicate::{AsAny, Classification, NetworkIdResolver, Replicate, UpdateError},
    scene_type::{SceneMut, SceneRef},
};
