//! Selection state of one attachable
//!
//! While selected, the attachable owns a keyboard listener for the
//! rotation-edit toggle and shows the selected outline. The listener exists
//! only in the `Selected` state; deselecting drops it together with any key
//! events still queued on it.

use crate::attach::control::RotationControl;
use crate::attach::node::AttachmentNode;
use crate::input::{KeyEvent, Keyboard, ListenerKey};
use crate::scene::Scene;
use crate::settings::AttachSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected,
}

struct KeyListener {
    key: ListenerKey,
    events: flume::Receiver<KeyEvent>,
}

#[derive(Default)]
pub struct SelectionController {
    state: SelectionState,
    listener: Option<KeyListener>,
    /// Set while the gizmo may be pointing at this node.
    gizmo_engaged: bool,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.state == SelectionState::Selected
    }

    #[must_use]
    pub fn listener_key(&self) -> Option<ListenerKey> {
        self.listener.as_ref().map(|l| l.key)
    }

    /// `Unselected → Selected`. No-op when already selected.
    pub fn select(
        &mut self,
        scene: &mut Scene,
        keyboard: &mut Keyboard,
        node: &mut AttachmentNode,
        control: &mut dyn RotationControl,
        settings: &AttachSettings,
    ) {
        if self.is_selected() {
            return;
        }

        let (key, events) = keyboard.add_listener();
        self.listener = Some(KeyListener { key, events });

        if control.is_enabled() {
            control.select_object(node.container(), node.id());
        }
        node.is_rotation_edit_enabled = control.is_enabled();
        self.gizmo_engaged = true;

        node.set_outline(scene, settings.selected_outline);
        self.state = SelectionState::Selected;
        log::debug!("Attachable {} selected", node.id());
    }

    /// `Selected → Unselected`. No-op when not selected.
    pub fn deselect(
        &mut self,
        scene: &mut Scene,
        keyboard: &mut Keyboard,
        node: &mut AttachmentNode,
        control: &mut dyn RotationControl,
        settings: &AttachSettings,
    ) {
        if !self.is_selected() {
            return;
        }

        if self.gizmo_engaged {
            control.deselect_object();
            self.gizmo_engaged = false;
        }
        self.remove_listener(keyboard);
        node.is_rotation_edit_enabled = false;

        node.set_outline(scene, settings.neutral_outline);
        self.state = SelectionState::Unselected;
        log::debug!("Attachable {} deselected", node.id());
    }

    /// Drains queued key events and applies the rotation-edit toggle for
    /// each matching one. Returns the number of toggles.
    pub fn pump_keys(
        &mut self,
        node: &mut AttachmentNode,
        control: &mut dyn RotationControl,
        settings: &AttachSettings,
    ) -> usize {
        let Some(listener) = &self.listener else {
            return 0;
        };
        let toggles = listener
            .events
            .try_iter()
            .filter(|e| settings.rotation_toggle.matches(e.key, e.modifiers))
            .count();

        for _ in 0..toggles {
            self.toggle_rotation_edit(node, control);
        }
        toggles
    }

    /// Flips rotation-edit mode. Ignored while unselected.
    pub fn toggle_rotation_edit(&mut self, node: &mut AttachmentNode, control: &mut dyn RotationControl) {
        if !self.is_selected() {
            return;
        }

        let enabled = !node.is_rotation_edit_enabled;
        node.is_rotation_edit_enabled = enabled;
        if enabled {
            control.select_object(node.container(), node.id());
            self.gizmo_engaged = true;
        } else {
            control.deselect_object();
        }
        control.set_enabled(enabled);
        log::debug!("Attachable {}: rotation edit {}", node.id(), if enabled { "on" } else { "off" });
    }

    /// Drops the listener without touching the gizmo or the highlight. Used
    /// on teardown, when the node and its control are going away anyway.
    pub fn release(&mut self, keyboard: &mut Keyboard) {
        self.remove_listener(keyboard);
        self.gizmo_engaged = false;
        self.state = SelectionState::Unselected;
    }

    fn remove_listener(&mut self, keyboard: &mut Keyboard) {
        if let Some(listener) = self.listener.take() {
            keyboard.remove_listener(listener.key);
        }
    }
}
