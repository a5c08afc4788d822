//! Attachable lifecycle
//!
//! Orchestrates one attachable from mount to teardown:
//!
//! ```text
//! Unmounted ──mount──▶ AwaitingCharacter ──character + model──▶ Initializing ──bind──▶ Ready
//!                            ▲                                                          │
//!                            └────────── character lost / model changed ────────────────┘
//! ```
//!
//! Any state goes back to `Unmounted` on [`AttachableLifecycle::teardown`].
//!
//! All work happens synchronously inside the calls below; there is no
//! background task. Resolution failures are "not yet", never errors: the
//! lifecycle waits in `AwaitingCharacter` and retries on the next relevant
//! event.
//!
//! # Feedback loops
//!
//! Every store write made here goes through a mirror that also merges the
//! update into the lifecycle's last-applied record. When the store echoes
//! the write back through [`update`](AttachableLifecycle::update), the diff
//! is empty and nothing is re-applied.

use std::sync::Arc;

use crate::assets::ModelData;
use crate::attach::binding::{BindingManager, RebindTarget};
use crate::attach::content::VisualContent;
use crate::attach::control::{
    GizmoEdit, RotationControl, RotationControlDesc, RotationControlFactory, SurfaceId, forwarding_callback,
};
use crate::attach::event::AttachEvent;
use crate::attach::frame::Pose;
use crate::attach::node::{AttachmentNode, CharacterRef};
use crate::attach::registry::AttachmentRegistry;
use crate::attach::selection::SelectionController;
use crate::attach::sync::TransformSynchronizer;
use crate::errors::{AttachError, Result};
use crate::input::Keyboard;
use crate::scene::{NodeHandle, Scene};
use crate::settings::AttachSettings;
use crate::store::{AttachableRecord, ObjectId, ObjectStore, ObjectUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Unmounted,
    AwaitingCharacter,
    Initializing,
    Ready,
}

/// Shared collaborators a lifecycle operates on.
///
/// Borrowed per call so several lifecycles can share one scene, store,
/// registry and keyboard.
pub struct AttachEnv<'a> {
    pub scene: &'a mut Scene,
    pub store: &'a mut dyn ObjectStore,
    pub registry: &'a mut AttachmentRegistry,
    pub keyboard: &'a mut Keyboard,
    pub controls: &'a mut dyn RotationControlFactory,
}

/// Forwards writes to the real store and merges writes for `record.id` into
/// `record`.
struct RecordMirror<'s> {
    store: &'s mut dyn ObjectStore,
    record: &'s mut AttachableRecord,
}

impl<'s> RecordMirror<'s> {
    fn new(store: &'s mut dyn ObjectStore, record: &'s mut AttachableRecord) -> Self {
        Self { store, record }
    }
}

impl ObjectStore for RecordMirror<'_> {
    fn update_object(&mut self, id: &ObjectId, update: ObjectUpdate) {
        if *id == self.record.id {
            self.record.apply(&update);
        }
        self.store.update_object(id, update);
    }

    fn delete_objects(&mut self, ids: &[ObjectId]) {
        self.store.delete_objects(ids);
    }
}

pub struct AttachableLifecycle {
    state: LifecycleState,
    /// Last applied store record.
    record: AttachableRecord,
    settings: Arc<AttachSettings>,

    model: Option<Arc<ModelData>>,
    /// Set after the model was rejected; cleared by a model change.
    model_rejected: bool,

    node: Option<AttachmentNode>,
    selection: SelectionController,
    selected: bool,

    control: Option<Box<dyn RotationControl>>,
    gizmo_tx: flume::Sender<GizmoEdit>,
    gizmo_rx: flume::Receiver<GizmoEdit>,
    camera: NodeHandle,
    surface: SurfaceId,
}

impl AttachableLifecycle {
    #[must_use]
    pub fn new(record: AttachableRecord, settings: Arc<AttachSettings>, camera: NodeHandle, surface: SurfaceId) -> Self {
        let (gizmo_tx, gizmo_rx) = flume::unbounded();
        Self {
            state: LifecycleState::Unmounted,
            record,
            settings,
            model: None,
            model_rejected: false,
            node: None,
            selection: SelectionController::new(),
            selected: false,
            control: None,
            gizmo_tx,
            gizmo_rx,
            camera,
            surface,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    #[must_use]
    pub fn id(&self) -> &ObjectId {
        &self.record.id
    }

    /// Last applied store record, including the core's own writes.
    #[must_use]
    pub fn record(&self) -> &AttachableRecord {
        &self.record
    }

    #[must_use]
    pub fn node(&self) -> Option<&AttachmentNode> {
        self.node.as_ref()
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    #[must_use]
    pub fn has_rotation_control(&self) -> bool {
        self.control.is_some()
    }

    // ========================================================================
    // Mount / teardown
    // ========================================================================

    /// `Unmounted → AwaitingCharacter`, then tries to initialize right away.
    pub fn mount(&mut self, env: &mut AttachEnv<'_>, model: Option<Arc<ModelData>>) {
        if self.state != LifecycleState::Unmounted {
            log::debug!("Attachable {} is already mounted", self.record.id);
            return;
        }

        self.node = Some(AttachmentNode::new(env.scene, self.record.id.clone()));
        self.model = model;
        self.model_rejected = false;
        self.state = LifecycleState::AwaitingCharacter;

        if self.record.loaded {
            self.write(env, ObjectUpdate::loaded(false));
        }
        self.try_initialize(env);
    }

    /// Any state → `Unmounted`. Removes the node from the scene and the
    /// registry and releases the rotation control. Safe to call repeatedly.
    pub fn teardown(&mut self, env: &mut AttachEnv<'_>) {
        if self.state == LifecycleState::Unmounted && self.node.is_none() {
            return;
        }

        self.drop_control(env);
        self.selection.release(env.keyboard);

        if let Some(mut node) = self.node.take() {
            BindingManager::unbind(env.scene, env.registry, &mut node);
            node.destroy(env.scene);
        }
        if self.record.loaded {
            self.write(env, ObjectUpdate::loaded(false));
        }

        self.gizmo_rx.try_iter().for_each(drop);
        self.state = LifecycleState::Unmounted;
        log::debug!("Attachable {} torn down", self.record.id);
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Applies a new store record: diffs it against the last applied one and
    /// dispatches bind target, size, position and rotation changes in that
    /// order.
    pub fn update(&mut self, env: &mut AttachEnv<'_>, record: AttachableRecord) {
        if record.id != self.record.id {
            log::warn!("Attachable {} ignored a record for {}", self.record.id, record.id);
            return;
        }

        let events = AttachEvent::diff(&self.record, &record);
        self.record = record;
        for event in events {
            self.dispatch(env, event);
        }
    }

    /// Handles a single change event.
    pub fn handle(&mut self, env: &mut AttachEnv<'_>, event: AttachEvent) {
        event.apply_to(&mut self.record);
        self.dispatch(env, event);
    }

    pub fn set_model(&mut self, env: &mut AttachEnv<'_>, model: Option<Arc<ModelData>>) {
        self.handle(env, AttachEvent::ModelChanged(model));
    }

    pub fn set_selected(&mut self, env: &mut AttachEnv<'_>, selected: bool) {
        self.handle(env, AttachEvent::SelectionChanged(selected));
    }

    pub fn set_camera(&mut self, env: &mut AttachEnv<'_>, camera: NodeHandle) {
        self.handle(env, AttachEvent::CameraChanged(camera));
    }

    /// Re-checks character availability after scene membership changed.
    pub fn scene_changed(&mut self, env: &mut AttachEnv<'_>) {
        self.handle(env, AttachEvent::SceneChanged);
    }

    /// Processes queued key presses and gizmo edits.
    ///
    /// Returns the number of gizmo edits written back to the store.
    pub fn pump(&mut self, env: &mut AttachEnv<'_>) -> usize {
        if self.is_ready()
            && let (Some(node), Some(control)) = (self.node.as_mut(), self.control.as_deref_mut())
        {
            self.selection.pump_keys(node, control, &self.settings);
        }

        let edits: Vec<GizmoEdit> = self.gizmo_rx.try_iter().collect();
        let Some(last) = edits.last() else {
            return 0;
        };
        if !self.is_ready() {
            log::debug!("Attachable {}: dropped {} gizmo edit(s) while not ready", self.record.id, edits.len());
            return 0;
        }
        let Some(node) = self.node.as_ref() else {
            return 0;
        };

        let mut store = RecordMirror::new(&mut *env.store, &mut self.record);
        let written = TransformSynchronizer::apply_world_rotation(env.scene, node, last.rotation)
            .and_then(|()| TransformSynchronizer::write_gizmo_rotation(env.scene, &mut store, node));
        match written {
            Ok(rotation) => {
                log::debug!("Attachable {}: gizmo rotation {rotation:?} saved", node.id());
                edits.len()
            }
            Err(err) => {
                log::warn!("Attachable {}: gizmo write-back failed: {err}", node.id());
                0
            }
        }
    }

    // ========================================================================
    // Host-driven operations
    // ========================================================================

    /// Rebinds onto the record's current target with an explicit character
    /// scale, e.g. after the host replaced the character.
    pub fn rebind(&mut self, env: &mut AttachEnv<'_>, character_scale: f32) -> Result<()> {
        if !self.is_ready() {
            return Err(AttachError::NotBound(self.record.id.clone()));
        }
        let Some(node) = self.node.as_mut() else {
            return Err(AttachError::NotBound(self.record.id.clone()));
        };

        let previous = node.character().map(|c| c.handle);
        let character_id = self.record.attach_to_id.clone();
        let bone_name = self.record.bind_bone_name.clone();
        let size = self.record.size;
        let mut store = RecordMirror::new(&mut *env.store, &mut self.record);
        let character = BindingManager::rebind(
            env.scene,
            env.registry,
            &mut store,
            node,
            RebindTarget {
                character: &character_id,
                bone_name: &bone_name,
                size,
                character_scale,
            },
        )?;
        self.on_character_switched(env, previous, &character);
        Ok(())
    }

    /// Writes the node's world position and rotation to the store.
    pub fn save_to_store(&mut self, env: &mut AttachEnv<'_>) -> Result<Pose> {
        if !self.is_ready() {
            return Err(AttachError::NotBound(self.record.id.clone()));
        }
        let node = self
            .node
            .as_ref()
            .ok_or_else(|| AttachError::NotBound(self.record.id.clone()))?;
        let mut store = RecordMirror::new(&mut *env.store, &mut self.record);
        TransformSynchronizer::save_to_store(env.scene, &mut store, node)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn dispatch(&mut self, env: &mut AttachEnv<'_>, event: AttachEvent) {
        match event {
            AttachEvent::BindTargetChanged { attach_to_id, bone_name } => {
                self.on_bind_target_changed(env, &attach_to_id, &bone_name);
            }
            AttachEvent::SizeChanged(size) => {
                if let Some(node) = self.ready_node_mut() {
                    let id = node.id().clone();
                    report(&id, "size", TransformSynchronizer::apply_size(env.scene, node, size));
                }
            }
            AttachEvent::PositionChanged(position) => {
                let tolerance = self.settings.tolerance;
                if let Some(node) = self.ready_node() {
                    let current = TransformSynchronizer::world_pose(env.scene, node);
                    if current.is_ok_and(|p| p.translation.abs_diff_eq(position, tolerance)) {
                        return;
                    }
                    report(node.id(), "position", TransformSynchronizer::apply_position(env.scene, node, position));
                }
            }
            AttachEvent::RotationChanged(rotation) => {
                if let Some(node) = self.ready_node() {
                    report(
                        node.id(),
                        "rotation",
                        TransformSynchronizer::apply_rotation(env.scene, node, rotation.to_vec3()),
                    );
                }
            }
            AttachEvent::SelectionChanged(selected) => {
                self.selected = selected;
                if self.is_ready() {
                    if selected {
                        self.select(env);
                    } else {
                        self.deselect(env);
                    }
                }
            }
            AttachEvent::ModelChanged(model) => self.on_model_changed(env, model),
            AttachEvent::CameraChanged(camera) => {
                self.camera = camera;
                if self.is_ready()
                    && let Some(control) = self.control.as_deref_mut()
                {
                    control.set_camera(camera);
                }
            }
            AttachEvent::SceneChanged => self.on_scene_changed(env),
        }
    }

    fn on_bind_target_changed(&mut self, env: &mut AttachEnv<'_>, attach_to_id: &ObjectId, bone_name: &str) {
        match self.state {
            LifecycleState::Ready => {}
            LifecycleState::AwaitingCharacter => {
                self.try_initialize(env);
                return;
            }
            LifecycleState::Unmounted | LifecycleState::Initializing => return,
        }

        let character = match BindingManager::resolve_character(env.scene, attach_to_id) {
            Ok(character) => character,
            Err(err) => {
                log::debug!("Attachable {}: {err}; waiting for the character", self.record.id);
                self.leave_ready(env);
                return;
            }
        };
        if let Err(err) = BindingManager::resolve_bone(env.scene, &character, bone_name) {
            log::warn!("Attachable {}: {err}; keeping the current binding", self.record.id);
            return;
        }

        let character_scale = BindingManager::character_scale(env.scene, &character);
        let size = self.record.size;
        let Some(node) = self.node.as_mut() else {
            return;
        };
        let previous = node.character().map(|c| c.handle);
        let mut store = RecordMirror::new(&mut *env.store, &mut self.record);
        let rebound = BindingManager::rebind(
            env.scene,
            env.registry,
            &mut store,
            node,
            RebindTarget {
                character: attach_to_id,
                bone_name,
                size,
                character_scale,
            },
        );
        match rebound {
            Ok(character) => self.on_character_switched(env, previous, &character),
            Err(err) => {
                // The container may have gone down with the old character.
                log::warn!("Attachable {}: rebind failed: {err}; rebuilding", self.record.id);
                self.leave_ready(env);
            }
        }
    }

    fn on_model_changed(&mut self, env: &mut AttachEnv<'_>, model: Option<Arc<ModelData>>) {
        let unchanged = match (&self.model, &model) {
            (Some(a), Some(b)) => a.id == b.id,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.model = model;
        self.model_rejected = false;
        if self.is_ready() {
            self.leave_ready(env);
        } else {
            self.try_initialize(env);
        }
    }

    fn on_scene_changed(&mut self, env: &mut AttachEnv<'_>) {
        match self.state {
            LifecycleState::Ready => {
                let lost = self.node.as_ref().is_none_or(|node| {
                    let character_gone = node
                        .character()
                        .is_none_or(|c| env.scene.find_root_by_object_id(&c.id) != Some(c.handle));
                    let bone_gone = node.bone().is_none_or(|b| !env.scene.contains(b));
                    character_gone || bone_gone
                });
                if lost {
                    log::info!("Attachable {}: character left the scene", self.record.id);
                    self.leave_ready(env);
                }
            }
            LifecycleState::AwaitingCharacter => {
                self.try_initialize(env);
            }
            LifecycleState::Unmounted | LifecycleState::Initializing => {}
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// `AwaitingCharacter → Initializing → Ready` if everything resolves.
    fn try_initialize(&mut self, env: &mut AttachEnv<'_>) -> bool {
        if self.state != LifecycleState::AwaitingCharacter || self.model_rejected {
            return false;
        }
        let Some(model) = self.model.clone() else {
            log::debug!("Attachable {}: no model data yet", self.record.id);
            return false;
        };

        let character = match BindingManager::resolve_character(env.scene, &self.record.attach_to_id)
            .and_then(|c| BindingManager::resolve_bone(env.scene, &c, &self.record.bind_bone_name).map(|_| c))
        {
            Ok(character) => character,
            Err(err) => {
                log::debug!("Attachable {}: {err}; waiting", self.record.id);
                return false;
            }
        };

        self.state = LifecycleState::Initializing;
        match self.initialize(env, &model, &character) {
            Ok(()) => {
                self.enter_ready(env);
                true
            }
            Err(err) => {
                self.abort_initialization(env, err);
                false
            }
        }
    }

    fn initialize(&mut self, env: &mut AttachEnv<'_>, model: &ModelData, character: &CharacterRef) -> Result<()> {
        let content = VisualContent::build(model, &self.record.id, &self.settings)?;

        // The container goes with its bone when a character is removed.
        if self.node.as_ref().is_none_or(|n| !env.scene.contains(n.container())) {
            log::debug!("Attachable {}: recreating container node", self.record.id);
            self.node = Some(AttachmentNode::new(env.scene, self.record.id.clone()));
        }
        let node = self.node.as_mut().ok_or(AttachError::NodeNotFound)?;
        node.set_content(env.scene, content)?;
        BindingManager::bind(
            env.scene,
            env.registry,
            node,
            character,
            &self.record.bind_bone_name,
            self.record.size,
        )?;

        self.control = Some(self.create_control(env, character));
        Ok(())
    }

    fn abort_initialization(&mut self, env: &mut AttachEnv<'_>, err: AttachError) {
        if let Some(node) = self.node.as_mut() {
            node.clear_content(env.scene);
            BindingManager::unbind(env.scene, env.registry, node);
        }
        self.state = LifecycleState::AwaitingCharacter;

        match err {
            AttachError::InvalidAttachmentContent(_) => {
                log::warn!("Attachable {}: {err}; deleting it from the store", self.record.id);
                self.model_rejected = true;
                env.store.delete_objects(std::slice::from_ref(&self.record.id));
            }
            AttachError::MalformedModel(_) => {
                log::warn!("Attachable {}: {err}; waiting for a new model", self.record.id);
                self.model_rejected = true;
            }
            err if err.is_resolution_failure() => {
                log::debug!("Attachable {}: {err}; waiting", self.record.id);
            }
            err => log::warn!("Attachable {}: initialization failed: {err}", self.record.id),
        }
    }

    fn enter_ready(&mut self, env: &mut AttachEnv<'_>) {
        self.state = LifecycleState::Ready;

        if let Some(node) = self.node.as_mut() {
            let id = node.id().clone();
            report(&id, "size", TransformSynchronizer::apply_size(env.scene, node, self.record.size));
            report(&id, "position", TransformSynchronizer::apply_position(env.scene, node, self.record.position()));
            report(
                &id,
                "rotation",
                TransformSynchronizer::apply_rotation(env.scene, node, self.record.rotation.to_vec3()),
            );
        }
        self.write(env, ObjectUpdate::loaded(true));
        log::info!("Attachable {} ready", self.record.id);

        if self.selected {
            self.select(env);
        }
    }

    /// `Ready → AwaitingCharacter`, then retries right away.
    fn leave_ready(&mut self, env: &mut AttachEnv<'_>) {
        self.drop_control(env);
        if let Some(node) = self.node.as_mut() {
            BindingManager::unbind(env.scene, env.registry, node);
            node.clear_content(env.scene);
        }
        self.state = LifecycleState::AwaitingCharacter;
        self.write(env, ObjectUpdate::loaded(false));

        self.try_initialize(env);
    }

    // ========================================================================
    // Rotation control & selection
    // ========================================================================

    fn create_control(&self, env: &mut AttachEnv<'_>, character: &CharacterRef) -> Box<dyn RotationControl> {
        let mut control = env.controls.create(
            env.scene,
            RotationControlDesc {
                camera: self.camera,
                surface: self.surface,
                character: character.handle,
            },
        );
        control.set_can_switch(false);
        control.set_rotation_callback(forwarding_callback(self.gizmo_tx.clone()));
        control
    }

    /// Rebuilds the control after a rebind onto another character node.
    fn on_character_switched(
        &mut self,
        env: &mut AttachEnv<'_>,
        previous: Option<NodeHandle>,
        character: &CharacterRef,
    ) {
        if self.control.is_none() || previous == Some(character.handle) {
            return;
        }
        let reselect = self.selection.is_selected();
        self.drop_control(env);
        self.control = Some(self.create_control(env, character));
        if reselect {
            self.select(env);
        }
    }

    /// Deselects (restoring the neutral outline) and drops the control.
    fn drop_control(&mut self, env: &mut AttachEnv<'_>) {
        self.deselect(env);
        self.control = None;
    }

    fn select(&mut self, env: &mut AttachEnv<'_>) {
        if let (Some(node), Some(control)) = (self.node.as_mut(), self.control.as_deref_mut()) {
            self.selection.select(env.scene, env.keyboard, node, control, &self.settings);
        }
    }

    fn deselect(&mut self, env: &mut AttachEnv<'_>) {
        if let (Some(node), Some(control)) = (self.node.as_mut(), self.control.as_deref_mut()) {
            self.selection.deselect(env.scene, env.keyboard, node, control, &self.settings);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn ready_node(&self) -> Option<&AttachmentNode> {
        self.node.as_ref().filter(|_| self.is_ready())
    }

    fn ready_node_mut(&mut self) -> Option<&mut AttachmentNode> {
        if self.is_ready() { self.node.as_mut() } else { None }
    }

    /// Store write mirrored into the last applied record.
    fn write(&mut self, env: &mut AttachEnv<'_>, update: ObjectUpdate) {
        let id = self.record.id.clone();
        RecordMirror::new(&mut *env.store, &mut self.record).update_object(&id, update);
    }
}

fn report<T>(id: &ObjectId, what: &str, result: Result<T>) {
    if let Err(err) = result {
        log::warn!("Attachable {id}: failed to apply {what}: {err}");
    }
}
