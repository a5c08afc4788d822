//! Rotation gizmo seam
//!
//! The drag-to-rotate widget lives outside this crate. The core only needs
//! to point it at a node, switch it on and off, and receive the rotations
//! the user produces. Edits come back through a `flume` channel rather than
//! a callback that borrows the lifecycle, so the gizmo can fire at any time
//! and the write-back runs on the next [`pump`].
//!
//! [`pump`]: crate::attach::AttachableLifecycle::pump

use glam::Quat;

use crate::scene::{NodeHandle, Scene};
use crate::store::ObjectId;

/// Render surface a control draws its handles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceId(pub u32);

/// Construction parameters for a [`RotationControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationControlDesc {
    pub camera: NodeHandle,
    pub surface: SurfaceId,
    /// Character the controlled attachable rides on.
    pub character: NodeHandle,
}

/// A rotation produced by dragging the gizmo.
#[derive(Debug, Clone, PartialEq)]
pub struct GizmoEdit {
    /// Name of the edited object as reported by the control.
    pub name: String,
    /// New world rotation.
    pub rotation: Quat,
}

/// Invoked with `(name, world_rotation)` whenever the user drags the gizmo.
pub type RotationCallback = Box<dyn FnMut(&str, Quat)>;

/// External rotation gizmo.
pub trait RotationControl {
    /// Attaches the gizmo to `node`.
    fn select_object(&mut self, node: NodeHandle, id: &ObjectId);

    fn deselect_object(&mut self);

    fn set_camera(&mut self, camera: NodeHandle);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Whether clicking another object may move the gizmo to it.
    fn set_can_switch(&mut self, can_switch: bool);

    fn set_rotation_callback(&mut self, callback: RotationCallback);
}

/// Builds one [`RotationControl`] per ready attachable.
pub trait RotationControlFactory {
    fn create(&mut self, scene: &Scene, desc: RotationControlDesc) -> Box<dyn RotationControl>;
}

/// Callback that forwards every edit into `sender`.
///
/// Edits sent after the receiver is gone are dropped.
#[must_use]
pub fn forwarding_callback(sender: flume::Sender<GizmoEdit>) -> RotationCallback {
    Box::new(move |name, rotation| {
        if sender
            .send(GizmoEdit {
                name: name.to_owned(),
                rotation,
            })
            .is_err()
        {
            log::debug!("Gizmo edit for '{name}' dropped: lifecycle is gone");
        }
    })
}
