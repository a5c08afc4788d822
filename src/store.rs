//! Document store boundary
//!
//! The persisted state of every attachable lives in an external document
//! store. This module defines the record shape, the partial-update payload
//! and the [`ObjectStore`] trait the core writes through.
//!
//! Positions and rotations in the store are always **world space**; the
//! attachment core converts them into bone-local space when applying them.
//!
//! [`MemoryStore`] is an in-memory implementation for tests and hosts that
//! do not have a document store of their own.

use std::fmt;

use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ObjectId
// ---------------------------------------------------------------------------

/// Store key of a scene object (attachable or character).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Euler rotation (radians, XYZ order) as stored in the document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Rotation {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

// ---------------------------------------------------------------------------
// ObjectUpdate
// ---------------------------------------------------------------------------

/// Partial field update sent to [`ObjectStore::update_object`].
///
/// Only `Some` fields are written; `None` fields are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_bone_name: Option<String>,
}

impl ObjectUpdate {
    /// World position update.
    #[must_use]
    pub fn position(position: Vec3) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            z: Some(position.z),
            ..Default::default()
        }
    }

    /// World rotation update.
    #[must_use]
    pub fn rotation(rotation: Rotation) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    /// Position and rotation in one write.
    #[must_use]
    pub fn pose(position: Vec3, rotation: Rotation) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::position(position)
        }
    }

    #[must_use]
    pub fn loaded(loaded: bool) -> Self {
        Self {
            loaded: Some(loaded),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// AttachableRecord
// ---------------------------------------------------------------------------

/// Full store record an attachable is driven from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachableRecord {
    pub id: ObjectId,
    /// Identifier of the character this attachable rides on.
    pub attach_to_id: ObjectId,
    /// Bone on the character's skeleton; may be empty while unbound.
    #[serde(default)]
    pub bind_bone_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub rotation: Rotation,
    pub size: f32,
    #[serde(default)]
    pub loaded: bool,
}

impl AttachableRecord {
    #[must_use]
    pub fn new(id: impl Into<ObjectId>, attach_to_id: impl Into<ObjectId>, bone: &str) -> Self {
        Self {
            id: id.into(),
            attach_to_id: attach_to_id.into(),
            bind_bone_name: bone.to_owned(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rotation: Rotation::default(),
            size: 1.0,
            loaded: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Merges a partial update into the record.
    pub fn apply(&mut self, update: &ObjectUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(z) = update.z {
            self.z = z;
        }
        if let Some(rotation) = update.rotation {
            self.rotation = rotation;
        }
        if let Some(size) = update.size {
            self.size = size;
        }
        if let Some(loaded) = update.loaded {
            self.loaded = loaded;
        }
        if let Some(bone) = &update.bind_bone_name {
            self.bind_bone_name.clone_from(bone);
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// Write side of the external document store.
pub trait ObjectStore {
    /// Writes the `Some` fields of `update` to the object keyed by `id`.
    fn update_object(&mut self, id: &ObjectId, update: ObjectUpdate);

    /// Deletes the given objects.
    fn delete_objects(&mut self, ids: &[ObjectId]);
}

/// In-memory [`ObjectStore`].
///
/// Keeps the merged records plus a log of every write so callers can observe
/// exactly what the core persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: FxHashMap<ObjectId, AttachableRecord>,
    updates: Vec<(ObjectId, ObjectUpdate)>,
    deleted: Vec<ObjectId>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&mut self, record: AttachableRecord) {
        self.records.insert(record.id.clone(), record);
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&AttachableRecord> {
        self.records.get(id)
    }

    /// Every update written so far, oldest first.
    #[must_use]
    pub fn updates(&self) -> &[(ObjectId, ObjectUpdate)] {
        &self.updates
    }

    /// Every id passed to `delete_objects`, oldest first.
    #[must_use]
    pub fn deleted(&self) -> &[ObjectId] {
        &self.deleted
    }

    /// Returns the update log and clears it.
    pub fn take_updates(&mut self) -> Vec<(ObjectId, ObjectUpdate)> {
        std::mem::take(&mut self.updates)
    }
}

impl ObjectStore for MemoryStore {
    fn update_object(&mut self, id: &ObjectId, update: ObjectUpdate) {
        match self.records.get_mut(id) {
            Some(record) => record.apply(&update),
            None => log::debug!("Update for unknown object {id} logged without a record"),
        }
        self.updates.push((id.clone(), update));
    }

    fn delete_objects(&mut self, ids: &[ObjectId]) {
        for id in ids {
            self.records.remove(id);
            self.deleted.push(id.clone());
        }
    }
}
