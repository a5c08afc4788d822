//! Attachable Settings
//!
//! Tunables for attachable presentation and interaction. Defaults reproduce
//! the editor's stock look: a violet outline when selected, a black outline
//! otherwise, `Ctrl + R` to toggle rotation editing, and a light-grey toon
//! material on the cloned meshes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_attach::settings::AttachSettings;
//!
//! let settings = AttachSettings::default();
//!
//! // Partial JSON, missing fields fall back to defaults
//! let settings = AttachSettings::from_json_str(r#"{ "tolerance": 0.001 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::input::{Key, Modifiers};
use crate::resources::material::OutlineParameters;
use crate::resources::mesh::RenderLayers;

// ---------------------------------------------------------------------------
// KeyBinding
// ---------------------------------------------------------------------------

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyBinding {
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Returns `true` if the event's key matches and all required modifiers
    /// are held. Extra modifiers are tolerated.
    #[inline]
    #[must_use]
    pub fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
        self.key == key && modifiers.contains(self.modifiers)
    }
}

// ---------------------------------------------------------------------------
// ToonSettings
// ---------------------------------------------------------------------------

/// Parameters of the flat toon material that replaces source materials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToonSettings {
    /// Base color as `0xRRGGBB`.
    pub color: u32,
    /// Emissive color as `0xRRGGBB`.
    pub emissive: u32,
    pub shininess: f32,
    pub flat_shading: bool,
}

impl Default for ToonSettings {
    fn default() -> Self {
        Self {
            color: 0x00cc_cccc,
            emissive: 0x0000_0000,
            shininess: 0.0,
            flat_shading: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AttachSettings
// ---------------------------------------------------------------------------

/// Configuration shared by every attachable lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachSettings {
    /// Outline applied while the attachable is selected.
    pub selected_outline: OutlineParameters,
    /// Outline applied while the attachable is not selected.
    pub neutral_outline: OutlineParameters,
    /// Toggles rotation-edit mode while selected.
    pub rotation_toggle: KeyBinding,
    /// Material used for the cloned meshes.
    pub toon: ToonSettings,
    /// Layers the cloned meshes render on.
    pub content_layers: RenderLayers,
    /// Floating-point tolerance for pose comparisons.
    pub tolerance: f32,
}

impl Default for AttachSettings {
    fn default() -> Self {
        Self {
            selected_outline: OutlineParameters {
                thickness: 0.008,
                color: [
                    122.0 / 256.0 / 2.0,
                    114.0 / 256.0 / 2.0,
                    233.0 / 256.0 / 2.0,
                ],
            },
            neutral_outline: OutlineParameters::NEUTRAL,
            rotation_toggle: KeyBinding::new(Key::R, Modifiers::CTRL),
            toon: ToonSettings::default(),
            content_layers: RenderLayers::LAYER_1 | RenderLayers::LAYER_3,
            tolerance: 1e-4,
        }
    }
}

impl AttachSettings {
    /// Parses settings from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings = serde_json::from_str(json)?;
        Ok(settings)
    }

    /// Serializes the settings to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
