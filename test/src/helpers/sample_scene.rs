use scenecast_shared::SceneRef;

use crate::{
    test_protocol::{Group, Material, SceneRoot, Spatial, Texture},
    test_world::{TestHandle, TestScene},
};

/// A small scene exercising every relation kind:
///
/// ```text
/// stage
/// └── world
///     ├── player   [material]
///     │   └── weapon [texture]
///     └── camera   [material]
/// ```
pub struct SampleScene {
    pub scene: TestScene,
    pub world: TestHandle,
    pub player: TestHandle,
    pub weapon: TestHandle,
    pub camera: TestHandle,
    pub material: TestHandle,
    pub texture: TestHandle,
}

impl SampleScene {
    /// Number of replicated objects, root included
    pub const OBJECT_COUNT: usize = 7;

    pub fn build() -> Self {
        let mut scene = TestScene::new(SceneRoot::new("stage"));
        let root = scene.root();
        let world = scene.spawn_child(root, Group::new("world"));
        let player = scene.spawn_child(world, Spatial::new("player", [0, 0, 0]));
        let weapon = scene.spawn_child(player, Spatial::new("weapon", [1, 0, 0]));
        let camera = scene.spawn_child(world, Spatial::new("camera", [0, 5, -10]));
        let material = scene.spawn_attribute(player, Material::new(0xff0000));
        scene.share(camera, material);
        let texture = scene.spawn_attribute(weapon, Texture::new("steel.png", 4, vec![7; 16]));

        Self {
            scene,
            world,
            player,
            weapon,
            camera,
            material,
            texture,
        }
    }
}
