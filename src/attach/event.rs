use std::sync::Arc;

use glam::Vec3;
use smallvec::SmallVec;

use crate::assets::ModelData;
use crate::scene::NodeHandle;
use crate::store::{AttachableRecord, ObjectId, Rotation};

/// Named change an [`AttachableLifecycle`](crate::attach::AttachableLifecycle)
/// reacts to.
#[derive(Debug, Clone)]
pub enum AttachEvent {
    /// Target character and/or bone changed.
    BindTargetChanged { attach_to_id: ObjectId, bone_name: String },
    SizeChanged(f32),
    /// New world position.
    PositionChanged(Vec3),
    /// New world rotation.
    RotationChanged(Rotation),
    SelectionChanged(bool),
    /// Source model replaced or cleared.
    ModelChanged(Option<Arc<ModelData>>),
    CameraChanged(NodeHandle),
    /// Scene membership changed; re-check that the character is still there.
    SceneChanged,
}

impl AttachEvent {
    /// Events that turn `old` into `new`, in dispatch order: bind target,
    /// size, position, rotation.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn diff(old: &AttachableRecord, new: &AttachableRecord) -> SmallVec<[Self; 4]> {
        let mut events = SmallVec::new();

        if old.attach_to_id != new.attach_to_id || old.bind_bone_name != new.bind_bone_name {
            events.push(Self::BindTargetChanged {
                attach_to_id: new.attach_to_id.clone(),
                bone_name: new.bind_bone_name.clone(),
            });
        }
        if old.size != new.size {
            events.push(Self::SizeChanged(new.size));
        }
        if old.position() != new.position() {
            events.push(Self::PositionChanged(new.position()));
        }
        if old.rotation != new.rotation {
            events.push(Self::RotationChanged(new.rotation));
        }
        events
    }

    /// Writes the event's value into `record`. Events that do not map to a
    /// record field are ignored.
    pub fn apply_to(&self, record: &mut AttachableRecord) {
        match self {
            Self::BindTargetChanged { attach_to_id, bone_name } => {
                record.attach_to_id.clone_from(attach_to_id);
                record.bind_bone_name.clone_from(bone_name);
            }
            Self::SizeChanged(size) => record.size = *size,
            Self::PositionChanged(p) => {
                record.x = p.x;
                record.y = p.y;
                record.z = p.z;
            }
            Self::RotationChanged(r) => record.rotation = *r,
            Self::SelectionChanged(_) | Self::ModelChanged(_) | Self::CameraChanged(_) | Self::SceneChanged => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_records_produce_nothing() {
        let record = AttachableRecord::new("hat", "bob", "Head");
        assert!(AttachEvent::diff(&record, &record.clone()).is_empty());
    }

    #[test]
    fn diff_order_is_fixed() {
        let old = AttachableRecord::new("hat", "bob", "Head");
        let mut new = old.clone();
        new.rotation = Rotation::new(0.0, 1.0, 0.0);
        new.x = 3.0;
        new.size = 2.0;
        new.bind_bone_name = "Hand".into();

        let kinds: Vec<&str> = AttachEvent::diff(&old, &new)
            .iter()
            .map(|e| match e {
                AttachEvent::BindTargetChanged { .. } => "bind",
                AttachEvent::SizeChanged(_) => "size",
                AttachEvent::PositionChanged(_) => "position",
                AttachEvent::RotationChanged(_) => "rotation",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["bind", "size", "position", "rotation"]);
    }

    #[test]
    fn loaded_flag_is_not_an_event() {
        let old = AttachableRecord::new("hat", "bob", "Head");
        let mut new = old.clone();
        new.loaded = true;
        assert!(AttachEvent::diff(&old, &new).is_empty());
    }
}
