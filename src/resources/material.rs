use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::ToonSettings;

/// Opaque reference to a texture owned by the asset layer.
///
/// Handles are shared freely between materials; copying one never copies
/// the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(Uuid);

impl TextureHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Outline pass parameters read by the renderer (selection highlight).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlineParameters {
    pub thickness: f32,
    pub color: [f32; 3],
}

impl OutlineParameters {
    /// The no-highlight outline.
    pub const NEUTRAL: Self = Self {
        thickness: 0.008,
        color: [0.0, 0.0, 0.0],
    };
}

impl Default for OutlineParameters {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Basic,
    Standard,
    Phong,
    Toon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,

    pub color: Vec3,
    pub emissive: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub flat_shading: bool,

    /// Diffuse map
    pub map: Option<TextureHandle>,
    /// Asks the renderer to re-upload `map`.
    pub map_needs_update: bool,

    pub outline: OutlineParameters,
}

impl Material {
    #[must_use]
    pub fn new(kind: MaterialKind, color: Vec3) -> Self {
        Self {
            name: "Material".to_string(),
            kind,
            color,
            emissive: Vec3::ZERO,
            specular: Vec3::ZERO,
            shininess: 30.0,
            flat_shading: false,
            map: None,
            map_needs_update: false,
            outline: OutlineParameters::NEUTRAL,
        }
    }

    #[must_use]
    pub fn new_standard(color: Vec3) -> Self {
        Self::new(MaterialKind::Standard, color)
    }

    /// Flat toon material built from [`ToonSettings`].
    #[must_use]
    pub fn new_toon(settings: &ToonSettings) -> Self {
        Self {
            name: "Toon".to_string(),
            emissive: rgb_hex(settings.emissive),
            shininess: settings.shininess,
            flat_shading: settings.flat_shading,
            ..Self::new(MaterialKind::Toon, rgb_hex(settings.color))
        }
    }

    #[must_use]
    pub fn with_map(mut self, map: TextureHandle) -> Self {
        self.map = Some(map);
        self
    }
}

/// `0xRRGGBB` to linear 0..1 components.
#[must_use]
pub fn rgb_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}
