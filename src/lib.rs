#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod attach;
pub mod errors;
pub mod input;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod store;

pub use assets::{ModelData, ModelMesh, ModelNode};
pub use attach::{
    AttachEnv, AttachEvent, AttachableLifecycle, AttachmentNode, AttachmentRegistry, BindingManager, LifecycleState,
    Pose, RotationControl, RotationControlFactory, SelectionController, TransformSynchronizer,
};
pub use errors::{AttachError, Result};
pub use input::{Key, KeyEvent, Keyboard, Modifiers};
pub use resources::{Geometry, Material, Mesh};
pub use scene::{Node, NodeHandle, Scene, Skeleton, Transform};
pub use settings::AttachSettings;
pub use store::{AttachableRecord, MemoryStore, ObjectId, ObjectStore, ObjectUpdate, Rotation};
