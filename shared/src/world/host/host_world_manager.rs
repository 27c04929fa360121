use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
    sync::{mpsc::Sender, Arc},
};

use log::{debug, info, trace, warn};

use crate::{
    types::Stamp,
    world::{
        change_clock::ChangeClock,
        host::{error::GraphIntegrityError, published_objects::PublishedObjects},
        network_event::{NetworkEvent, WireEvent},
        network_id::{NetworkId, NetworkIdGenerator},
        object_kinds::ObjectKinds,
        replicate::Classification,
        scene_type::{SceneMut, SceneRef},
    },
};

struct HostRecord<E> {
    handle: E,
    classification: Classification,
    parents: Vec<NetworkId>,
    published_at: Stamp,
}

/// Publisher-side bookkeeping: which local objects have identities, what
/// each was last published as, and which events the scene's evolution
/// requires. Events are pushed to the outbound queue as they are discovered.
pub struct HostWorldManager<E: Copy + Eq + Hash> {
    object_kinds: Arc<ObjectKinds>,
    id_generator: NetworkIdGenerator,
    handle_to_id: HashMap<E, NetworkId>,
    records: HashMap<NetworkId, HostRecord<E>>,
    root: Option<NetworkId>,
    published: PublishedObjects,
    outgoing: Sender<WireEvent>,
}

impl<E: Copy + Eq + Hash> HostWorldManager<E> {
    pub fn new(
        object_kinds: Arc<ObjectKinds>,
        published: PublishedObjects,
        outgoing: Sender<WireEvent>,
    ) -> Self {
        Self {
            object_kinds,
            id_generator: NetworkIdGenerator::new(),
            handle_to_id: HashMap::new(),
            records: HashMap::new(),
            root: None,
            published,
            outgoing,
        }
    }

    pub fn network_id(&self, handle: &E) -> Option<NetworkId> {
        self.handle_to_id.get(handle).copied()
    }

    pub fn handle(&self, network_id: &NetworkId) -> Option<E> {
        self.records.get(network_id).map(|record| record.handle)
    }

    pub fn root(&self) -> Option<NetworkId> {
        self.root
    }

    /// Number of objects currently holding an identity
    pub fn registered_count(&self) -> usize {
        self.records.len()
    }

    /// Declared parents currently published for `network_id`
    pub fn parents(&self, network_id: &NetworkId) -> Option<&[NetworkId]> {
        self.records
            .get(network_id)
            .map(|record| record.parents.as_slice())
    }

    /// Give the scene root an identity and discover everything reachable
    /// from it. Registering the same root again does nothing.
    pub fn register<W: SceneMut<E>>(&mut self, world: &mut W) -> Result<NetworkId, GraphIntegrityError> {
        let root = world.root();
        if let Some(network_id) = self.handle_to_id.get(&root) {
            return Ok(*network_id);
        }

        let object = world.object(&root).ok_or(GraphIntegrityError::UnknownObject)?;
        if !self.object_kinds.is_registered(object) {
            return Err(GraphIntegrityError::UnregisteredKind {
                type_name: object.kind_name(),
            });
        }

        let root_id = self.assign(world, root, Vec::new())?;
        self.root = Some(root_id);
        self.register_attributes(world, &root, root_id)?;
        self.register_descendants(world, root)?;

        info!(
            "Registered scene root {} with {} replicated objects",
            root_id,
            self.records.len()
        );
        Ok(root_id)
    }

    /// Register one node under its already registered parent, along with any
    /// attributes it owns. Known nodes and known ownerships produce no events.
    pub fn register_node<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        handle: &E,
    ) -> Result<NetworkId, GraphIntegrityError> {
        let object = world.object(handle).ok_or(GraphIntegrityError::UnknownObject)?;
        let type_name = object.kind_name();
        if !object.wants_sync() {
            return Err(GraphIntegrityError::NotSynchronized { type_name });
        }
        if !self.object_kinds.is_registered(object) {
            return Err(GraphIntegrityError::UnregisteredKind { type_name });
        }

        let parent = world
            .parent(handle)
            .ok_or(GraphIntegrityError::MissingParent { type_name })?;
        let Some(parent_id) = self.handle_to_id.get(&parent).copied() else {
            let parent_type = world
                .object(&parent)
                .map(|object| object.kind_name())
                .unwrap_or("<missing>");
            return Err(GraphIntegrityError::ParentNotRegistered {
                type_name,
                parent_type,
            });
        };

        let network_id = match self.handle_to_id.get(handle) {
            Some(network_id) => *network_id,
            None => self.assign(world, *handle, vec![parent_id])?,
        };
        self.register_attributes(world, handle, network_id)?;
        Ok(network_id)
    }

    /// Bring the published picture up to date with the scene: structure first,
    /// then one full-state `Update` per object changed since its last publication
    pub fn scan_for_changes<W: SceneMut<E>>(&mut self, world: &mut W) -> Result<(), GraphIntegrityError> {
        let root_id = self.root.ok_or(GraphIntegrityError::RootNotRegistered)?;
        let root = self
            .records
            .get(&root_id)
            .map(|record| record.handle)
            .ok_or(GraphIntegrityError::RootNotRegistered)?;

        self.register_attributes(world, &root, root_id)?;
        let reachable = self.register_descendants(world, root)?;

        let mut removed = Vec::new();
        self.reconcile_unreachable_nodes(&*world, root_id, &reachable, &mut removed);
        self.reconcile_attribute_owners(&*world, &mut removed);

        removed.sort();
        for network_id in removed {
            self.forget(&network_id);
            debug!("Object {} left the scene", network_id);
            self.emit(NetworkEvent::Remove {
                network_id,
                stamp: ChangeClock::tick(),
            });
        }

        let mut changed: Vec<NetworkId> = self
            .records
            .iter()
            .filter(|(_, record)| {
                world
                    .object(&record.handle)
                    .is_some_and(|object| object.last_change() > record.published_at)
            })
            .map(|(network_id, _)| *network_id)
            .collect();
        changed.sort();
        for network_id in changed {
            if let Some(record) = self.records.get_mut(&network_id) {
                record.published_at = ChangeClock::tick();
            }
            trace!("Object {} changed, publishing full state", network_id);
            self.emit_update(&*world, &network_id);
        }

        Ok(())
    }

    /// Explicitly retire `handle` and every registered node below it. Call
    /// before despawning the objects locally.
    pub fn remove_node<W: SceneRef<E>>(
        &mut self,
        world: &W,
        handle: &E,
    ) -> Result<Vec<NetworkId>, GraphIntegrityError> {
        let Some(network_id) = self.handle_to_id.get(handle).copied() else {
            let type_name = world
                .object(handle)
                .map(|object| object.kind_name())
                .unwrap_or("<missing>");
            return Err(GraphIntegrityError::NotRegistered { type_name });
        };

        let mut removed = vec![network_id];
        let mut stack = vec![*handle];
        while let Some(current) = stack.pop() {
            for child in world.children(&current) {
                if let Some(child_id) = self.handle_to_id.get(&child) {
                    removed.push(*child_id);
                    stack.push(child);
                }
            }
        }

        for network_id in &removed {
            self.forget(network_id);
            self.emit(NetworkEvent::Remove {
                network_id: *network_id,
                stamp: ChangeClock::tick(),
            });
        }
        Ok(removed)
    }

    // Private

    /// Pre-order walk below `start`. Unknown nodes are registered, known
    /// nodes found under a new parent emit `NewRelation`. Subtrees of nodes
    /// that opt out of sync are skipped. Returns every node id reached.
    fn register_descendants<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        start: E,
    ) -> Result<HashSet<NetworkId>, GraphIntegrityError> {
        let mut reachable = HashSet::new();
        let Some(start_id) = self.handle_to_id.get(&start).copied() else {
            return Ok(reachable);
        };
        reachable.insert(start_id);
        self.register_attributes(world, &start, start_id)?;

        let mut stack = Vec::new();
        push_synced_children(&*world, &start, start_id, &mut stack);

        while let Some((node, parent_id)) = stack.pop() {
            let node_id = match self.handle_to_id.get(&node).copied() {
                None => self.register_node(world, &node)?,
                Some(node_id) => {
                    self.relate(node_id, parent_id);
                    self.register_attributes(world, &node, node_id)?;
                    node_id
                }
            };
            reachable.insert(node_id);
            push_synced_children(&*world, &node, node_id, &mut stack);
        }

        Ok(reachable)
    }

    /// Register unseen attributes of `owner`, and record `owner` as an
    /// additional owner of attributes already known
    fn register_attributes<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        owner: &E,
        owner_id: NetworkId,
    ) -> Result<(), GraphIntegrityError> {
        for attribute in world.attributes(owner) {
            let Some(object) = world.object(&attribute) else {
                warn!("Attribute of {} is missing from the scene", owner_id);
                continue;
            };
            if !object.wants_sync() {
                continue;
            }
            if !self.object_kinds.is_registered(object) {
                return Err(GraphIntegrityError::UnregisteredKind {
                    type_name: object.kind_name(),
                });
            }

            match self.handle_to_id.get(&attribute).copied() {
                None => {
                    self.assign(world, attribute, vec![owner_id])?;
                }
                Some(attribute_id) => {
                    let Some(record) = self.records.get_mut(&attribute_id) else {
                        continue;
                    };
                    if record.parents.contains(&owner_id) {
                        continue;
                    }
                    record.parents.push(owner_id);
                    self.published.set_parents(&attribute_id, &record.parents);
                    debug!("Attribute {} gained owner {}", attribute_id, owner_id);
                    self.emit(NetworkEvent::NewRelation {
                        parent: Some(owner_id),
                        child: attribute_id,
                        stamp: ChangeClock::tick(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Detached nodes emit `NewRelation(None, ..)`, nodes moved inside a
    /// detached subtree emit `NewRelation(parent, ..)`, despawned nodes are
    /// collected for removal
    fn reconcile_unreachable_nodes<W: SceneRef<E>>(
        &mut self,
        world: &W,
        root_id: NetworkId,
        reachable: &HashSet<NetworkId>,
        removed: &mut Vec<NetworkId>,
    ) {
        let mut unreachable: Vec<NetworkId> = self
            .records
            .iter()
            .filter(|(network_id, record)| {
                record.classification == Classification::Node
                    && **network_id != root_id
                    && !reachable.contains(network_id)
            })
            .map(|(network_id, _)| *network_id)
            .collect();
        unreachable.sort();

        for network_id in unreachable {
            let Some(handle) = self.handle(&network_id) else {
                continue;
            };
            if !world.has_object(&handle) {
                removed.push(network_id);
                continue;
            }
            match world.parent(&handle) {
                None => {
                    let Some(record) = self.records.get_mut(&network_id) else {
                        continue;
                    };
                    if record.parents.is_empty() {
                        continue;
                    }
                    record.parents.clear();
                    self.published.set_parents(&network_id, &[]);
                    debug!("Node {} detached from the scene", network_id);
                    self.emit(NetworkEvent::NewRelation {
                        parent: None,
                        child: network_id,
                        stamp: ChangeClock::tick(),
                    });
                }
                Some(parent) => {
                    if let Some(parent_id) = self.handle_to_id.get(&parent).copied() {
                        self.relate(network_id, parent_id);
                    }
                }
            }
        }
    }

    /// Attributes that lost an owner emit `RemoveRelation`, despawned
    /// attributes are collected for removal
    fn reconcile_attribute_owners<W: SceneRef<E>>(&mut self, world: &W, removed: &mut Vec<NetworkId>) {
        let mut owners: HashMap<NetworkId, HashSet<NetworkId>> = HashMap::new();
        for (owner_id, record) in &self.records {
            if record.classification != Classification::Node || !world.has_object(&record.handle) {
                continue;
            }
            for attribute in world.attributes(&record.handle) {
                if let Some(attribute_id) = self.handle_to_id.get(&attribute) {
                    owners.entry(*attribute_id).or_default().insert(*owner_id);
                }
            }
        }

        let mut attributes: Vec<NetworkId> = self
            .records
            .iter()
            .filter(|(_, record)| record.classification == Classification::Attribute)
            .map(|(network_id, _)| *network_id)
            .collect();
        attributes.sort();

        for attribute_id in attributes {
            let Some(record) = self.records.get_mut(&attribute_id) else {
                continue;
            };
            if !world.has_object(&record.handle) {
                removed.push(attribute_id);
                continue;
            }

            let current = owners.remove(&attribute_id).unwrap_or_default();
            let lost: Vec<NetworkId> = record
                .parents
                .iter()
                .filter(|owner_id| !current.contains(owner_id))
                .copied()
                .collect();
            if lost.is_empty() {
                continue;
            }
            record.parents.retain(|owner_id| current.contains(owner_id));
            self.published.set_parents(&attribute_id, &record.parents);

            for owner_id in lost {
                debug!("Attribute {} lost owner {}", attribute_id, owner_id);
                self.emit(NetworkEvent::RemoveRelation {
                    parent: owner_id,
                    child: attribute_id,
                    stamp: ChangeClock::tick(),
                });
            }
        }
    }

    /// Record `parent_id` as the single parent of node `network_id`,
    /// emitting `NewRelation` if that is a change
    fn relate(&mut self, network_id: NetworkId, parent_id: NetworkId) {
        let Some(record) = self.records.get_mut(&network_id) else {
            return;
        };
        if record.parents.len() == 1 && record.parents[0] == parent_id {
            return;
        }
        record.parents = vec![parent_id];
        self.published.set_parents(&network_id, &[parent_id]);
        debug!("Node {} moved under {}", network_id, parent_id);
        self.emit(NetworkEvent::NewRelation {
            parent: Some(parent_id),
            child: network_id,
            stamp: ChangeClock::tick(),
        });
    }

    /// Hand out an identity, stamp it on the object and publish its first `Update`
    fn assign<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        handle: E,
        parents: Vec<NetworkId>,
    ) -> Result<NetworkId, GraphIntegrityError> {
        let object = world
            .object_mut(&handle)
            .ok_or(GraphIntegrityError::UnknownObject)?;
        let network_id = self.id_generator.generate();
        object.set_network_id(network_id);
        let classification = object.classification();

        self.handle_to_id.insert(handle, network_id);
        self.records.insert(
            network_id,
            HostRecord {
                handle,
                classification,
                parents,
                published_at: ChangeClock::tick(),
            },
        );
        trace!("Assigned {} to a new {:?}", network_id, classification);

        self.emit_update(&*world, &network_id);
        Ok(network_id)
    }

    /// Snapshot the object now and queue a full-state `Update`. An object that
    /// cannot be snapshotted is logged and skipped.
    fn emit_update<W: SceneRef<E>>(&self, world: &W, network_id: &NetworkId) {
        let Some(record) = self.records.get(network_id) else {
            return;
        };
        let Some(object) = world.object(&record.handle) else {
            return;
        };

        let is_root = record.handle == world.root();
        let update = WireEvent::update_for(
            &self.object_kinds,
            object,
            *network_id,
            record.parents.clone(),
            record.published_at,
        )
        .map(|event| if is_root { event.into_root() } else { event });

        match update {
            Ok(event) => {
                self.published.insert(*network_id, event.clone());
                self.emit(event);
            }
            Err(err) => {
                warn!("Dropping update for {}: {}", network_id, err);
            }
        }
    }

    fn forget(&mut self, network_id: &NetworkId) {
        if let Some(record) = self.records.remove(network_id) {
            self.handle_to_id.remove(&record.handle);
        }
        self.published.remove(network_id);
        if self.root == Some(*network_id) {
            self.root = None;
        }
    }

    fn emit(&self, event: WireEvent) {
        if self.outgoing.send(event).is_err() {
            debug!("Outbound queue closed, event dropped");
        }
    }
}

/// Queue the children of `node` that want sync, first child on top
fn push_synced_children<E: Copy, W: SceneRef<E>>(
    world: &W,
    node: &E,
    node_id: NetworkId,
    stack: &mut Vec<(E, NetworkId)>,
) {
    for child in world.children(node).into_iter().rev() {
        if world
            .object(&child)
            .is_some_and(|object| object.wants_sync())
        {
            stack.push((child, node_id));
        }
    }
}
