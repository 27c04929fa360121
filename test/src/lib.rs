pub mod helpers;
pub mod local_socket;
pub mod test_protocol;

pub use helpers::*;
pub use local_socket::{LocalHub, LocalPublisherSocket, LocalSubscriberSocket};
pub use test_protocol::{
    conditioned_protocol, protocol, Group, LinkedNode, Material, SceneRoot, Spatial, Texture,
};
pub use test_world::{TestHandle, TestScene};
