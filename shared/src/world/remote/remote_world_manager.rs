use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
};

use log::{debug, trace, warn};

use crate::{
    constants::DEFAULT_TOMBSTONE_LIMIT,
    types::Stamp,
    world::{
        network_event::{NetworkEvent, RemoteEvent},
        network_id::NetworkId,
        remote::{
            error::RemoteWorldError,
            mirror_event::MirrorEvent,
            network_id_map::NetworkIdMap,
            network_waitlist::{NetworkWaitlist, WaitReason},
            tombstones::Tombstones,
        },
        replicate::{Classification, Replicate, UpdateError},
        scene_type::SceneMut,
    },
};

struct RemoteRecord {
    classification: Classification,
    parents: Vec<NetworkId>,
    /// `published_at` of the newest state merged
    state_stamp: Stamp,
    /// Stamp of the newest structural change applied
    relation_stamp: Stamp,
}

impl RemoteRecord {
    fn new(classification: Classification, stamp: Stamp) -> Self {
        Self {
            classification,
            parents: Vec::new(),
            state_stamp: stamp,
            relation_stamp: stamp,
        }
    }
}

/// Subscriber-side mirror maintenance. Applies remote events to a scene in
/// receipt order, parking any event that names an identity not seen yet and
/// replaying it the moment that identity appears.
pub struct RemoteWorldManager<E: Copy + Eq + Hash> {
    id_map: NetworkIdMap<E>,
    records: HashMap<NetworkId, RemoteRecord>,
    tombstones: Tombstones,
    waitlist: NetworkWaitlist<Box<dyn Replicate>>,
    outgoing_events: Vec<MirrorEvent>,
}

impl<E: Copy + Eq + Hash> Default for RemoteWorldManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy + Eq + Hash> RemoteWorldManager<E> {
    pub fn new() -> Self {
        Self::with_tombstone_limit(DEFAULT_TOMBSTONE_LIMIT)
    }

    /// Remember at most `limit` removed identities. Once one is forgotten, a
    /// very late `Update` for it would spawn it again.
    pub fn with_tombstone_limit(limit: usize) -> Self {
        Self {
            id_map: NetworkIdMap::new(),
            records: HashMap::new(),
            tombstones: Tombstones::new(limit),
            waitlist: NetworkWaitlist::new(),
            outgoing_events: Vec::new(),
        }
    }

    pub fn network_id(&self, handle: &E) -> Option<NetworkId> {
        self.id_map.network_id(handle)
    }

    pub fn handle(&self, network_id: &NetworkId) -> Option<E> {
        self.id_map.handle(network_id)
    }

    pub fn known_count(&self) -> usize {
        self.id_map.len()
    }

    pub fn is_removed(&self, network_id: &NetworkId) -> bool {
        self.tombstones.contains(network_id)
    }

    pub fn waitlist(&self) -> &NetworkWaitlist<Box<dyn Replicate>> {
        &self.waitlist
    }

    /// Apply `events` in order and report what changed in the mirror
    pub fn process_events<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        events: impl IntoIterator<Item = RemoteEvent>,
    ) -> Vec<MirrorEvent> {
        for event in events {
            self.process_event(world, event);
        }
        self.take_events()
    }

    /// Apply one event, then everything it unblocks. Events parked on a newly
    /// known identity replay in their original order before anything else.
    pub fn process_event<W: SceneMut<E>>(&mut self, world: &mut W, event: RemoteEvent) {
        let mut work = VecDeque::new();
        work.push_back(event);

        while let Some(next) = work.pop_front() {
            match self.apply(world, next) {
                Ok(Some(resolved)) => {
                    let parked = self.waitlist.take(&resolved);
                    if !parked.is_empty() {
                        debug!("Replaying {} events parked on {}", parked.len(), resolved);
                    }
                    for entry in parked.into_iter().rev() {
                        work.push_front(entry.event);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("Skipping remote event: {}", err),
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<MirrorEvent> {
        std::mem::take(&mut self.outgoing_events)
    }

    // Private

    /// Returns the id that became known, if any
    fn apply<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        if let Some(subject) = event.subject() {
            if self.tombstones.contains(&subject) {
                trace!("Ignoring event about removed object {}", subject);
                return Ok(None);
            }
        }

        let known = event
            .subject()
            .is_some_and(|subject| self.id_map.contains(&subject));

        match event {
            NetworkEvent::Update { .. } if known => self.apply_known_update(world, event),
            NetworkEvent::Update { .. } => self.apply_first_sight(world, event),
            NetworkEvent::NewRelation { .. } => self.apply_new_relation(world, event),
            NetworkEvent::RemoveRelation { .. } => self.apply_remove_relation(world, event),
            NetworkEvent::Remove { .. } => self.apply_remove(world, event),
            NetworkEvent::RequestInitialization => Ok(None),
        }
    }

    fn apply_first_sight<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        let NetworkEvent::Update {
            wrapper,
            constructor_parameters,
            side_channel,
        } = &event
        else {
            return Ok(None);
        };
        let network_id = wrapper.network_id;
        let published_at = wrapper.published_at;
        let parents = wrapper.parents.clone();
        let classification = wrapper.object.classification();

        if wrapper.is_root {
            return self.adopt_root(world, event);
        }
        // a node without parents is detached and spawned on its own
        if classification == Classification::Node {
            if let Some(parent_id) = parents.first().filter(|id| !self.id_map.contains(id)) {
                let parent_id = *parent_id;
                self.park(parent_id, event, WaitReason::Parent);
                return Ok(None);
            }
        }

        let object = match constructor_parameters {
            Some(parameters) => wrapper
                .object
                .construct_with_parameters(parameters)
                .unwrap_or_else(|| {
                    debug!(
                        "{} cannot be built from parameters, using the incoming object",
                        wrapper.object.kind_name()
                    );
                    wrapper.object.copy_to_box()
                }),
            None => wrapper.object.copy_to_box(),
        };

        let handle = world.spawn_object(object);
        self.id_map.insert(network_id, handle);
        let merge = match world.object_mut(&handle) {
            Some(local) => {
                local.set_network_id(network_id);
                local.update(&*wrapper.object, &self.id_map, side_channel.as_deref())
            }
            None => {
                self.id_map.remove(&network_id);
                return Err(RemoteWorldError::ObjectMissing { network_id });
            }
        };
        self.outgoing_events.push(MirrorEvent::Spawn(network_id));

        let mut record = RemoteRecord::new(classification, published_at);
        match classification {
            Classification::Node => {
                // parent presence checked above
                if let Some(parent) = parents.first().and_then(|id| self.id_map.handle(id)) {
                    world.add_child(&parent, &handle);
                    record.parents = vec![parents[0]];
                }
            }
            Classification::Attribute => {
                for owner_id in parents {
                    match self.id_map.handle(&owner_id) {
                        Some(owner) => {
                            world.add_attribute(&owner, &handle);
                            record.parents.push(owner_id);
                        }
                        None => self.park(
                            owner_id,
                            NetworkEvent::NewRelation {
                                parent: Some(owner_id),
                                child: network_id,
                                stamp: published_at,
                            },
                            WaitReason::Parent,
                        ),
                    }
                }
            }
        }
        self.records.insert(network_id, record);
        trace!("Spawned {} as {:?}", network_id, classification);

        self.settle_merge(network_id, merge, event)?;
        Ok(Some(network_id))
    }

    /// The caller's existing root takes on the replicated root's identity and
    /// state instead of a new object being built. A merge that fails outright
    /// leaves the local root unmapped.
    fn adopt_root<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        let NetworkEvent::Update {
            wrapper,
            side_channel,
            ..
        } = &event
        else {
            return Ok(None);
        };
        let network_id = wrapper.network_id;

        let root = world.root();
        if let Some(existing) = self.id_map.network_id(&root) {
            return Err(RemoteWorldError::DuplicateRoot {
                existing,
                incoming: network_id,
            });
        }

        let Some(local) = world.object_mut(&root) else {
            return Err(RemoteWorldError::ObjectMissing { network_id });
        };
        let merge = match local.update(&*wrapper.object, &self.id_map, side_channel.as_deref()) {
            Err(UpdateError::NotFound(missing)) => Err(UpdateError::NotFound(missing)),
            Err(source) => return Err(RemoteWorldError::MergeFailed { network_id, source }),
            Ok(()) => Ok(()),
        };
        local.set_network_id(network_id);
        self.id_map.insert(network_id, root);
        self.records.insert(
            network_id,
            RemoteRecord::new(Classification::Node, wrapper.published_at),
        );
        self.outgoing_events.push(MirrorEvent::Spawn(network_id));
        debug!("Adopted local scene root as {}", network_id);

        self.settle_merge(network_id, merge, event)?;
        Ok(Some(network_id))
    }

    fn apply_known_update<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        let NetworkEvent::Update {
            wrapper,
            side_channel,
            ..
        } = &event
        else {
            return Ok(None);
        };
        let network_id = wrapper.network_id;
        let published_at = wrapper.published_at;
        let declared = wrapper.parents.clone();

        let state_stamp = self
            .records
            .get(&network_id)
            .map(|record| record.state_stamp)
            .ok_or(RemoteWorldError::RecordMissing { network_id })?;
        if published_at < state_stamp {
            trace!("Ignoring stale update for {}", network_id);
            return Ok(None);
        }

        let handle = self
            .id_map
            .handle(&network_id)
            .ok_or(RemoteWorldError::ObjectMissing { network_id })?;
        let merge = world
            .object_mut(&handle)
            .ok_or(RemoteWorldError::ObjectMissing { network_id })?
            .update(&*wrapper.object, &self.id_map, side_channel.as_deref());

        if merge.is_ok() {
            if let Some(record) = self.records.get_mut(&network_id) {
                record.state_stamp = published_at;
            }
            self.outgoing_events.push(MirrorEvent::Update(network_id));
            self.reconcile_declared_parents(world, network_id, handle, &declared, published_at);
        }

        self.settle_merge(network_id, merge, event)?;
        Ok(None)
    }

    /// Bring parents in line with those declared by an update that is at
    /// least as new as the last structural change
    fn reconcile_declared_parents<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        network_id: NetworkId,
        handle: E,
        declared: &[NetworkId],
        published_at: Stamp,
    ) {
        let Some(record) = self.records.get_mut(&network_id) else {
            return;
        };
        if published_at < record.relation_stamp {
            return;
        }
        record.relation_stamp = published_at;

        let mut waiting = Vec::new();
        let mut changed = false;
        match record.classification {
            Classification::Node => {
                let current = record.parents.first().copied();
                let wanted = declared.first().copied();
                if current != wanted {
                    match wanted.map(|id| (id, self.id_map.handle(&id))) {
                        Some((parent_id, None)) => waiting.push(parent_id),
                        wanted => {
                            if let Some(old) = current.and_then(|id| self.id_map.handle(&id)) {
                                world.remove_child(&old, &handle);
                            }
                            record.parents.clear();
                            if let Some((parent_id, Some(parent))) = wanted {
                                world.add_child(&parent, &handle);
                                record.parents.push(parent_id);
                            }
                            changed = true;
                        }
                    }
                }
            }
            Classification::Attribute => {
                for owner_id in declared {
                    if record.parents.contains(owner_id) {
                        continue;
                    }
                    match self.id_map.handle(owner_id) {
                        Some(owner) => {
                            world.add_attribute(&owner, &handle);
                            record.parents.push(*owner_id);
                            changed = true;
                        }
                        None => waiting.push(*owner_id),
                    }
                }
                let extra: Vec<NetworkId> = record
                    .parents
                    .iter()
                    .filter(|owner_id| !declared.contains(owner_id))
                    .copied()
                    .collect();
                for owner_id in extra {
                    if let Some(owner) = self.id_map.handle(&owner_id) {
                        world.remove_attribute(&owner, &handle);
                    }
                    record.parents.retain(|id| *id != owner_id);
                    changed = true;
                }
            }
        }

        if changed {
            self.outgoing_events.push(MirrorEvent::Relation(network_id));
        }
        for parent_id in waiting {
            self.park(
                parent_id,
                NetworkEvent::NewRelation {
                    parent: Some(parent_id),
                    child: network_id,
                    stamp: published_at,
                },
                WaitReason::Parent,
            );
        }
    }

    fn apply_new_relation<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        let NetworkEvent::NewRelation {
            parent,
            child,
            stamp,
        } = event
        else {
            return Ok(None);
        };

        if let Some(parent_id) = parent {
            if self.tombstones.contains(&parent_id) {
                trace!("Ignoring relation to removed object {}", parent_id);
                return Ok(None);
            }
            if !self.id_map.contains(&parent_id) {
                self.park(parent_id, event, WaitReason::Parent);
                return Ok(None);
            }
        }
        let Some(child_handle) = self.id_map.handle(&child) else {
            self.park(child, event, WaitReason::Subject);
            return Ok(None);
        };

        let record = self
            .records
            .get_mut(&child)
            .ok_or(RemoteWorldError::RecordMissing { network_id: child })?;
        if stamp < record.relation_stamp {
            trace!("Ignoring stale relation for {}", child);
            return Ok(None);
        }
        record.relation_stamp = stamp;

        let parent_handle = parent.and_then(|id| self.id_map.handle(&id));
        let changed = match record.classification {
            Classification::Node => {
                let current = record.parents.first().copied();
                if current == parent {
                    false
                } else {
                    if let Some(old) = current.and_then(|id| self.id_map.handle(&id)) {
                        world.remove_child(&old, &child_handle);
                    }
                    record.parents.clear();
                    if let (Some(parent_id), Some(new_parent)) = (parent, parent_handle) {
                        world.add_child(&new_parent, &child_handle);
                        record.parents.push(parent_id);
                    }
                    true
                }
            }
            Classification::Attribute => match (parent, parent_handle) {
                (Some(owner_id), Some(owner)) => {
                    if record.parents.contains(&owner_id) {
                        false
                    } else {
                        world.add_attribute(&owner, &child_handle);
                        record.parents.push(owner_id);
                        true
                    }
                }
                _ => {
                    // no owner given: release the attribute from all of them
                    for owner_id in record.parents.drain(..) {
                        if let Some(owner) = self.id_map.handle(&owner_id) {
                            world.remove_attribute(&owner, &child_handle);
                        }
                    }
                    true
                }
            },
        };

        if changed {
            trace!("Relation of {} is now {:?}", child, parent);
            self.outgoing_events.push(MirrorEvent::Relation(child));
        }
        Ok(None)
    }

    fn apply_remove_relation<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        let NetworkEvent::RemoveRelation {
            parent,
            child,
            stamp,
        } = event
        else {
            return Ok(None);
        };

        if self.tombstones.contains(&parent) {
            return Ok(None);
        }
        let Some(parent_handle) = self.id_map.handle(&parent) else {
            self.park(parent, event, WaitReason::Parent);
            return Ok(None);
        };
        let Some(child_handle) = self.id_map.handle(&child) else {
            self.park(child, event, WaitReason::Subject);
            return Ok(None);
        };

        let record = self
            .records
            .get_mut(&child)
            .ok_or(RemoteWorldError::RecordMissing { network_id: child })?;
        if stamp < record.relation_stamp {
            trace!("Ignoring stale relation removal for {}", child);
            return Ok(None);
        }
        record.relation_stamp = stamp;

        if !record.parents.contains(&parent) {
            return Ok(None);
        }
        record.parents.retain(|id| *id != parent);
        match record.classification {
            Classification::Node => world.remove_child(&parent_handle, &child_handle),
            Classification::Attribute => world.remove_attribute(&parent_handle, &child_handle),
        }
        self.outgoing_events.push(MirrorEvent::Relation(child));
        Ok(None)
    }

    /// Despawn and retire the id. Later events about it are ignored, parked
    /// events about it are discarded.
    fn apply_remove<W: SceneMut<E>>(
        &mut self,
        world: &mut W,
        event: RemoteEvent,
    ) -> Result<Option<NetworkId>, RemoteWorldError> {
        let NetworkEvent::Remove { network_id, .. } = event else {
            return Ok(None);
        };

        self.tombstones.insert(network_id);
        let purged = self.waitlist.purge_subject(&network_id)
            + self.waitlist.take(&network_id).len();
        if purged > 0 {
            debug!("Discarded {} parked events about removed {}", purged, network_id);
        }

        let Some(handle) = self.id_map.remove(&network_id) else {
            return Ok(None);
        };
        if let Some(record) = self.records.remove(&network_id) {
            for parent_id in &record.parents {
                if let Some(parent) = self.id_map.handle(parent_id) {
                    match record.classification {
                        Classification::Node => world.remove_child(&parent, &handle),
                        Classification::Attribute => world.remove_attribute(&parent, &handle),
                    }
                }
            }
        }
        let dependents = world
            .children(&handle)
            .into_iter()
            .chain(world.attributes(&handle))
            .filter_map(|dependent| self.id_map.network_id(&dependent));
        for dependent in dependents.collect::<Vec<_>>() {
            if let Some(record) = self.records.get_mut(&dependent) {
                record.parents.retain(|id| *id != network_id);
            }
        }

        world.despawn_object(&handle);
        self.outgoing_events.push(MirrorEvent::Despawn(network_id));
        debug!("Removed {} from the mirror", network_id);
        Ok(None)
    }

    /// An unresolved reference parks the whole update on the missing id
    fn settle_merge(
        &mut self,
        network_id: NetworkId,
        merge: Result<(), UpdateError>,
        event: RemoteEvent,
    ) -> Result<(), RemoteWorldError> {
        match merge {
            Ok(()) => Ok(()),
            Err(UpdateError::NotFound(missing)) => {
                if self.id_map.contains(&missing) {
                    return Err(RemoteWorldError::SpuriousNotFound {
                        network_id,
                        missing,
                    });
                }
                self.park(missing, event, WaitReason::Reference);
                Ok(())
            }
            Err(source) => Err(RemoteWorldError::MergeFailed { network_id, source }),
        }
    }

    fn park(&mut self, missing: NetworkId, event: RemoteEvent, reason: WaitReason) {
        if self.tombstones.contains(&missing) {
            debug!("Discarding event waiting on removed {}", missing);
            return;
        }
        trace!("Parking event on {} ({:?})", missing, reason);
        self.waitlist.queue(missing, event, reason);
    }
}
