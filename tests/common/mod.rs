//! Shared fixtures for the integration tests: float helpers, a skinned
//! character builder, sample models and a recording rotation control.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use myth_attach::assets::{ModelData, ModelMesh, ModelNode};
use myth_attach::attach::control::{RotationCallback, RotationControl, RotationControlDesc, RotationControlFactory};
use myth_attach::attach::AttachEnv;
use myth_attach::attach::registry::AttachmentRegistry;
use myth_attach::input::Keyboard;
use myth_attach::resources::material::TextureHandle;
use myth_attach::resources::{Geometry, Material, Mesh};
use myth_attach::scene::{Node, NodeHandle, Scene, Skeleton};
use myth_attach::store::{MemoryStore, ObjectId};

// ============================================================================
// Float helpers
// ============================================================================

pub const EPSILON: f32 = 1e-4;

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

/// Same orientation, ignoring quaternion sign.
pub fn quat_approx(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() > 1.0 - EPSILON
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Characters
// ============================================================================

pub struct Character {
    pub handle: NodeHandle,
    /// Bone chain, parent first.
    pub bones: Vec<NodeHandle>,
}

impl Character {
    pub fn bone(&self, scene: &Scene, name: &str) -> NodeHandle {
        *self
            .bones
            .iter()
            .find(|&&b| scene.get_name(b) == Some(name))
            .unwrap_or_else(|| panic!("no bone named {name}"))
    }
}

/// Hips → Spine → Head, with rotations so bone space differs from world.
pub fn default_rig() -> Vec<(&'static str, Vec3, Quat)> {
    vec![
        ("Hips", Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
        ("Spine", Vec3::new(0.0, 0.5, 0.0), Quat::from_rotation_z(0.3)),
        ("Head", Vec3::new(0.0, 0.5, 0.0), Quat::from_rotation_y(0.8)),
    ]
}

/// Adds a character as a direct child of the scene: a root node carrying
/// `id`, a bone chain and a skinned body mesh bound to it.
pub fn spawn_character(
    scene: &mut Scene,
    id: &str,
    position: Vec3,
    scale: f32,
    rig: &[(&str, Vec3, Quat)],
) -> Character {
    let mut root = Node::new();
    root.transform.position = position;
    root.transform.set_uniform_scale(scale);
    let handle = scene.add_node(root);
    scene.set_object_id(handle, ObjectId::from(id));
    scene.set_name(handle, id);

    let mut parent = handle;
    let mut bones = Vec::new();
    for &(name, offset, rotation) in rig {
        let mut node = Node::new();
        node.transform.position = offset;
        node.transform.rotation = rotation;
        let bone = scene.add_to_parent(node, parent);
        scene.set_name(bone, name);
        bones.push(bone);
        parent = bone;
    }

    let skeleton = scene.add_skeleton(Skeleton::new(&format!("{id}-rig"), bones.clone(), 0));
    let body = Mesh::new(
        Geometry::new(vec![Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)]),
        Material::new_standard(Vec3::ONE),
    )
    .with_name("body");
    let body = scene.add_mesh(body, Some(handle));
    scene.bind_skin(body, skeleton);

    scene.update_matrix_world();
    Character { handle, bones }
}

// ============================================================================
// Models
// ============================================================================

/// One textured mesh whose geometry is centred away from the origin.
pub fn static_model() -> ModelData {
    let mut model = ModelData::new();
    let geometry = model.add_geometry(Geometry::new(vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.2, 0.4, 0.2),
    ]));
    let material = Material::new_standard(Vec3::X).with_map(TextureHandle::new());
    model.add_node(ModelNode::with_mesh(ModelMesh::new("brim", geometry, material)), None);
    model
}

/// One static mesh and one skinned mesh.
pub fn skinned_model() -> ModelData {
    let mut model = static_model();
    let geometry = model.add_geometry(Geometry::new(vec![Vec3::ZERO, Vec3::ONE]));
    model.skins.push("rig".to_string());
    let mut mesh = ModelMesh::new("cape", geometry, Material::new_standard(Vec3::ONE));
    mesh.skin = Some(0);
    model.add_node(ModelNode::with_mesh(mesh), None);
    model
}

// ============================================================================
// Rotation control double
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    Select(NodeHandle),
    Deselect,
    SetCamera(NodeHandle),
    SetEnabled(bool),
    SetCanSwitch(bool),
}

#[derive(Default)]
pub struct ControlState {
    pub calls: Vec<ControlCall>,
    pub enabled: bool,
    pub can_switch: bool,
    pub selected: Option<NodeHandle>,
    pub callback: Option<RotationCallback>,
    pub created: Vec<RotationControlDesc>,
}

impl ControlState {
    /// Simulates the user dragging the gizmo.
    pub fn drag(&mut self, name: &str, rotation: Quat) {
        let callback = self.callback.as_mut().expect("no rotation callback installed");
        callback(name, rotation);
    }
}

/// Rotation control that records every call into shared state.
pub struct RecordingControl {
    pub state: Rc<RefCell<ControlState>>,
}

impl RecordingControl {
    pub fn new(state: Rc<RefCell<ControlState>>) -> Self {
        Self { state }
    }
}

impl RotationControl for RecordingControl {
    fn select_object(&mut self, node: NodeHandle, _id: &ObjectId) {
        let mut state = self.state.borrow_mut();
        state.selected = Some(node);
        state.calls.push(ControlCall::Select(node));
    }

    fn deselect_object(&mut self) {
        let mut state = self.state.borrow_mut();
        state.selected = None;
        state.calls.push(ControlCall::Deselect);
    }

    fn set_camera(&mut self, camera: NodeHandle) {
        self.state.borrow_mut().calls.push(ControlCall::SetCamera(camera));
    }

    fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.enabled = enabled;
        state.calls.push(ControlCall::SetEnabled(enabled));
    }

    fn set_can_switch(&mut self, can_switch: bool) {
        let mut state = self.state.borrow_mut();
        state.can_switch = can_switch;
        state.calls.push(ControlCall::SetCanSwitch(can_switch));
    }

    fn set_rotation_callback(&mut self, callback: RotationCallback) {
        self.state.borrow_mut().callback = Some(callback);
    }
}

/// Factory whose controls all share one [`ControlState`].
#[derive(Default)]
pub struct RecordingFactory {
    pub state: Rc<RefCell<ControlState>>,
}

impl RotationControlFactory for RecordingFactory {
    fn create(&mut self, _scene: &Scene, desc: RotationControlDesc) -> Box<dyn RotationControl> {
        self.state.borrow_mut().created.push(desc);
        Box::new(RecordingControl::new(Rc::clone(&self.state)))
    }
}

// ============================================================================
// World
// ============================================================================

/// Everything a lifecycle needs, owned in one place.
pub struct World {
    pub scene: Scene,
    pub store: MemoryStore,
    pub registry: AttachmentRegistry,
    pub keyboard: Keyboard,
    pub controls: RecordingFactory,
    pub camera: NodeHandle,
}

impl World {
    pub fn new() -> Self {
        init_logger();
        let mut scene = Scene::new();
        let camera = scene.add_node(Node::new());
        Self {
            scene,
            store: MemoryStore::new(),
            registry: AttachmentRegistry::new(),
            keyboard: Keyboard::new(),
            controls: RecordingFactory::default(),
            camera,
        }
    }

    pub fn env(&mut self) -> AttachEnv<'_> {
        AttachEnv {
            scene: &mut self.scene,
            store: &mut self.store,
            registry: &mut self.registry,
            keyboard: &mut self.keyboard,
            controls: &mut self.controls,
        }
    }

    pub fn control(&self) -> std::cell::RefMut<'_, ControlState> {
        self.controls.state.borrow_mut()
    }

    /// Fresh world position of `node`.
    pub fn world_position(&mut self, node: NodeHandle) -> Vec3 {
        self.scene
            .refreshed_world_matrix(node)
            .map(|m| Vec3::from(m.translation))
            .expect("node is alive")
    }
}
