use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Spatial transform: translation, rotation (euler), scale.
///
/// Components are `f64` vectors so values survive a JSON round-trip exactly;
/// each serializes as a 3-element array on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

/// Surface material. A flat color is all the downstream renderer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub color: DVec3,
}

impl Default for Material {
    fn default() -> Self {
        Self { color: DVec3::ONE }
    }
}
