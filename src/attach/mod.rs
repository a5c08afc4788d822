//! Attachment core
//!
//! Binds attachables to named bones of skinned characters and keeps their
//! world pose in sync with an external document store:
//! - frame: world ↔ parent-local pose conversion
//! - node: the scene-side container of one attachable
//! - registry: character ↔ attachable membership
//! - binding: bind / rebind / unbind onto a bone
//! - sync: applying store values and writing edits back
//! - selection: highlight, key listener and rotation-edit toggle
//! - lifecycle: the state machine tying it all together

pub mod binding;
pub mod content;
pub mod control;
pub mod event;
pub mod frame;
pub mod lifecycle;
pub mod node;
pub mod registry;
pub mod selection;
pub mod sync;

pub use binding::{BindingManager, RebindTarget, normalized_scale};
pub use content::VisualContent;
pub use control::{GizmoEdit, RotationCallback, RotationControl, RotationControlDesc, RotationControlFactory, SurfaceId};
pub use event::AttachEvent;
pub use frame::Pose;
pub use lifecycle::{AttachEnv, AttachableLifecycle, LifecycleState};
pub use node::{AttachmentNode, BindState, CharacterRef};
pub use registry::AttachmentRegistry;
pub use selection::{SelectionController, SelectionState};
pub use sync::TransformSynchronizer;
