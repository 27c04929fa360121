pub mod sample_scene;
pub mod wire;

pub use assertions::{assert_scenes_match, scene_signature, ObjectSignature};
pub use sample_scene::SampleScene;
pub use wire::{kinds, to_remote, wait_until};
