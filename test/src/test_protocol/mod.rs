/// Object kinds used across the integration tests: a root, plain and
/// positioned nodes, shareable attributes and a node that references another
/// object by id

use std::any::type_name;

use serde::{Deserialize, Serialize};

use scenecast_shared::{
    ChangeMarker, Classification, LinkConditionerConfig, NetworkId, NetworkIdResolver, Protocol,
    Replicate, Stamp, UpdateError,
};

fn downcast<R: Replicate>(incoming: &dyn Replicate) -> Result<&R, UpdateError> {
    incoming
        .as_any()
        .downcast_ref::<R>()
        .ok_or(UpdateError::KindMismatch {
            expected: type_name::<R>(),
            found: incoming.kind_name(),
        })
}

/// Identity & change tracking shared by every kind below
macro_rules! replicate_common {
    () => {
        fn network_id(&self) -> Option<NetworkId> {
            self.network_id
        }

        fn set_network_id(&mut self, network_id: NetworkId) {
            self.network_id = Some(network_id);
        }

        fn last_change(&self) -> Stamp {
            self.change.last_change()
        }

        fn copy_to_box(&self) -> Box<dyn Replicate> {
            Box::new(self.clone())
        }
    };
}

// SceneRoot

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneRoot {
    pub name: String,
    #[serde(skip)]
    network_id: Option<NetworkId>,
    #[serde(skip)]
    change: ChangeMarker,
}

impl SceneRoot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            network_id: None,
            change: ChangeMarker::new(),
        }
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.change.mark();
    }
}

impl Replicate for SceneRoot {
    replicate_common!();

    fn update(
        &mut self,
        incoming: &dyn Replicate,
        _resolver: &dyn NetworkIdResolver,
        _side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError> {
        self.name = downcast::<Self>(incoming)?.name.clone();
        Ok(())
    }
}

// Group

/// Plain structural node. A local-only group is never replicated, and
/// neither is anything below it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(skip)]
    local_only: bool,
    #[serde(skip)]
    network_id: Option<NetworkId>,
    #[serde(skip)]
    change: ChangeMarker,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            local_only: false,
            network_id: None,
            change: ChangeMarker::new(),
        }
    }

    pub fn local_only(name: &str) -> Self {
        Self {
            local_only: true,
            ..Self::new(name)
        }
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.change.mark();
    }
}

impl Replicate for Group {
    replicate_common!();

    fn update(
        &mut self,
        incoming: &dyn Replicate,
        _resolver: &dyn NetworkIdResolver,
        _side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError> {
        self.name = downcast::<Self>(incoming)?.name.clone();
        Ok(())
    }

    fn wants_sync(&self) -> bool {
        !self.local_only
    }
}

// Spatial

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Spatial {
    pub name: String,
    pub position: [i32; 3],
    #[serde(skip)]
    network_id: Option<NetworkId>,
    #[serde(skip)]
    change: ChangeMarker,
}

impl Spatial {
    pub fn new(name: &str, position: [i32; 3]) -> Self {
        Self {
            name: name.to_string(),
            position,
            network_id: None,
            change: ChangeMarker::new(),
        }
    }

    pub fn move_to(&mut self, position: [i32; 3]) {
        self.position = position;
        self.change.mark();
    }
}

impl Replicate for Spatial {
    replicate_common!();

    fn update(
        &mut self,
        incoming: &dyn Replicate,
        _resolver: &dyn NetworkIdResolver,
        _side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError> {
        let incoming = downcast::<Self>(incoming)?;
        self.name = incoming.name.clone();
        self.position = incoming.position;
        Ok(())
    }
}

// Material

/// Shareable attribute
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Material {
    pub color: u32,
    #[serde(skip)]
    network_id: Option<NetworkId>,
    #[serde(skip)]
    change: ChangeMarker,
}

impl Material {
    pub fn new(color: u32) -> Self {
        Self {
            color,
            network_id: None,
            change: ChangeMarker::new(),
        }
    }

    pub fn paint(&mut self, color: u32) {
        self.color = color;
        self.change.mark();
    }
}

impl Replicate for Material {
    replicate_common!();

    fn update(
        &mut self,
        incoming: &dyn Replicate,
        _resolver: &dyn NetworkIdResolver,
        _side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError> {
        self.color = downcast::<Self>(incoming)?.color;
        Ok(())
    }

    fn classification(&self) -> Classification {
        Classification::Attribute
    }
}

// Texture

/// Attribute built from constructor parameters on the subscriber, with its
/// pixel data carried on the side channel instead of in the snapshot
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Texture {
    pub path: String,
    pub resolution: u32,
    #[serde(skip)]
    pixels: Vec<u8>,
    #[serde(skip)]
    built_from_parameters: bool,
    #[serde(skip)]
    network_id: Option<NetworkId>,
    #[serde(skip)]
    change: ChangeMarker,
}

impl Texture {
    pub fn new(path: &str, resolution: u32, pixels: Vec<u8>) -> Self {
        Self {
            path: path.to_string(),
            resolution,
            pixels,
            built_from_parameters: false,
            network_id: None,
            change: ChangeMarker::new(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn built_from_parameters(&self) -> bool {
        self.built_from_parameters
    }

    pub fn repaint(&mut self, pixels: Vec<u8>) {
        self.pixels = pixels;
        self.change.mark();
    }
}

impl Replicate for Texture {
    replicate_common!();

    fn update(
        &mut self,
        incoming: &dyn Replicate,
        _resolver: &dyn NetworkIdResolver,
        side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError> {
        let incoming = downcast::<Self>(incoming)?;
        self.path = incoming.path.clone();
        self.resolution = incoming.resolution;
        if let Some(pixels) = side_channel {
            if pixels.len() > (self.resolution as usize).pow(2) {
                return Err(UpdateError::InvalidSideChannel {
                    reason: format!(
                        "{} bytes of pixels for resolution {}",
                        pixels.len(),
                        self.resolution
                    ),
                });
            }
            self.pixels = pixels.to_vec();
        }
        Ok(())
    }

    fn classification(&self) -> Classification {
        Classification::Attribute
    }

    fn constructor_parameters(&self) -> Option<Vec<u8>> {
        Some(self.resolution.to_le_bytes().to_vec())
    }

    fn construct_with_parameters(&self, parameters: &[u8]) -> Option<Box<dyn Replicate>> {
        let resolution = u32::from_le_bytes(parameters.try_into().ok()?);
        let mut texture = Texture::new(&self.path, resolution, Vec::new());
        texture.built_from_parameters = true;
        Some(Box::new(texture))
    }

    fn side_channel_data(&self) -> Option<Vec<u8>> {
        Some(self.pixels.clone())
    }
}

// LinkedNode

/// Node whose state points at another object. Merging fails with
/// `NotFound` until the target is known locally.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkedNode {
    pub name: String,
    pub target: Option<NetworkId>,
    #[serde(skip)]
    network_id: Option<NetworkId>,
    #[serde(skip)]
    change: ChangeMarker,
}

impl LinkedNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: None,
            network_id: None,
            change: ChangeMarker::new(),
        }
    }

    pub fn link(&mut self, target: NetworkId) {
        self.target = Some(target);
        self.change.mark();
    }
}

impl Replicate for LinkedNode {
    replicate_common!();

    fn update(
        &mut self,
        incoming: &dyn Replicate,
        resolver: &dyn NetworkIdResolver,
        _side_channel: Option<&[u8]>,
    ) -> Result<(), UpdateError> {
        let incoming = downcast::<Self>(incoming)?;
        if let Some(target) = &incoming.target {
            resolver.require(target)?;
        }
        self.name = incoming.name.clone();
        self.target = incoming.target;
        Ok(())
    }
}

pub fn protocol() -> Protocol {
    Protocol::builder()
        .add_kind::<SceneRoot>()
        .add_kind::<Group>()
        .add_kind::<Spatial>()
        .add_kind::<Material>()
        .add_kind::<Texture>()
        .add_kind::<LinkedNode>()
        .build()
}

/// Same kinds, with inbound frames passed through a simulated network
pub fn conditioned_protocol(config: LinkConditionerConfig) -> Protocol {
    let mut protocol = protocol();
    protocol.link_condition(config);
    protocol
}
