use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    connection::frame_codec::{deserialize_value, serialize_value},
    types::KindId,
    world::{error::ObjectKindsError, replicate::Replicate},
};

/// ObjectKind - should be one unique value for each type of replicable object
#[derive(Eq, Hash, Copy, Clone, PartialEq, Debug)]
pub struct ObjectKind {
    type_id: TypeId,
}

impl From<TypeId> for ObjectKind {
    fn from(type_id: TypeId) -> Self {
        Self { type_id }
    }
}

impl ObjectKind {
    pub fn of<R: Replicate>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
        }
    }

    /// Kind of a type-erased object
    pub fn of_object(object: &dyn Replicate) -> Self {
        Self {
            type_id: Any::type_id(object.as_any()),
        }
    }
}

/// Serialized state of one object, tagged with its registered kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub kind: KindId,
    pub bytes: Vec<u8>,
}

type WriteFn = fn(&dyn Replicate) -> Result<Vec<u8>, ObjectKindsError>;
type ReadFn = fn(&[u8]) -> Result<Box<dyn Replicate>, ObjectKindsError>;

struct KindEntry {
    net_id: KindId,
    type_name: &'static str,
    write: WriteFn,
    read: ReadFn,
}

fn write_object<R: Replicate + Serialize>(object: &dyn Replicate) -> Result<Vec<u8>, ObjectKindsError> {
    let object = object
        .as_any()
        .downcast_ref::<R>()
        .ok_or(ObjectKindsError::DowncastFailed {
            type_name: type_name::<R>(),
        })?;
    serialize_value(object).map_err(|reason| ObjectKindsError::SerializationFailed {
        type_name: type_name::<R>(),
        reason,
    })
}

fn read_object<R: Replicate + DeserializeOwned>(
    bytes: &[u8],
) -> Result<Box<dyn Replicate>, ObjectKindsError> {
    let object: R =
        deserialize_value(bytes).map_err(|reason| ObjectKindsError::DeserializationFailed {
            type_name: type_name::<R>(),
            reason,
        })?;
    Ok(Box::new(object))
}

/// A map to hold all object kinds, ids assigned in registration order
pub struct ObjectKinds {
    current_net_id: KindId,
    kind_map: HashMap<ObjectKind, KindEntry>,
    net_id_map: HashMap<KindId, ObjectKind>,
}

impl Default for ObjectKinds {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectKinds {
    pub fn new() -> Self {
        Self {
            current_net_id: 0,
            kind_map: HashMap::new(),
            net_id_map: HashMap::new(),
        }
    }

    /// Registering the same type twice keeps the first id
    pub fn add_kind<R: Replicate + Serialize + DeserializeOwned>(&mut self) {
        let object_kind = ObjectKind::of::<R>();
        if self.kind_map.contains_key(&object_kind) {
            return;
        }

        let net_id = self.current_net_id;
        self.kind_map.insert(
            object_kind,
            KindEntry {
                net_id,
                type_name: type_name::<R>(),
                write: write_object::<R>,
                read: read_object::<R>,
            },
        );
        self.net_id_map.insert(net_id, object_kind);
        self.current_net_id += 1;
    }

    pub fn is_registered(&self, object: &dyn Replicate) -> bool {
        self.kind_map.contains_key(&ObjectKind::of_object(object))
    }

    pub fn kind_id_of(&self, object: &dyn Replicate) -> Result<KindId, ObjectKindsError> {
        self.kind_map
            .get(&ObjectKind::of_object(object))
            .map(|entry| entry.net_id)
            .ok_or(ObjectKindsError::KindNotRegistered {
                type_name: object.kind_name(),
            })
    }

    pub fn kind_name(&self, kind_id: KindId) -> Option<&'static str> {
        let kind = self.net_id_map.get(&kind_id)?;
        self.kind_map.get(kind).map(|entry| entry.type_name)
    }

    /// Snapshot an object's full state
    pub fn write(&self, object: &dyn Replicate) -> Result<ObjectSnapshot, ObjectKindsError> {
        let entry = self
            .kind_map
            .get(&ObjectKind::of_object(object))
            .ok_or(ObjectKindsError::KindNotRegistered {
                type_name: object.kind_name(),
            })?;
        Ok(ObjectSnapshot {
            kind: entry.net_id,
            bytes: (entry.write)(object)?,
        })
    }

    /// Rebuild an object from a snapshot received off the network
    pub fn read(&self, snapshot: &ObjectSnapshot) -> Result<Box<dyn Replicate>, ObjectKindsError> {
        let entry = self
            .net_id_map
            .get(&snapshot.kind)
            .and_then(|kind| self.kind_map.get(kind))
            .ok_or(ObjectKindsError::UnknownKindId {
                kind_id: snapshot.kind,
                registered: self.kind_map.len(),
            })?;
        (entry.read)(&snapshot.bytes)
    }

    pub fn len(&self) -> usize {
        self.kind_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind_map.is_empty()
    }
}
