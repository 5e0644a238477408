use glam::DVec3;
use scenepatch_common::{Material, Transform};
use serde::{Deserialize, Serialize};

/// A single scene object: a flat record, no hierarchy.
///
/// Entities are owned exclusively by the world's entity list and addressed by
/// their string `id`. Insertion order is preserved on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub material: Material,
}

fn default_kind() -> String {
    "cube".to_owned()
}

impl Entity {
    /// Create an entity with documented field defaults.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            transform: Transform::default(),
            material: Material::default(),
        }
    }
}

/// The scene camera. Created on demand with a zero translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub translation: DVec3,
}

/// The scene light. Defaults to white at full intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub color: DVec3,
    pub intensity: f64,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: DVec3::ONE,
            intensity: 1.0,
        }
    }
}

/// The persisted scene document consumed by the external renderer.
///
/// `camera` and `light` may be absent from a loaded document; mutation ops
/// create them on demand. They are omitted from the serialized form while
/// absent rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct World {
    pub entities: Vec<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<Light>,
}

impl World {
    /// The world synthesized when no world file exists yet.
    pub fn bootstrap() -> Self {
        Self {
            entities: Vec::new(),
            camera: Some(Camera {
                translation: DVec3::new(0.0, 5.0, 10.0),
            }),
            light: Some(Light::default()),
        }
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Find an entity by id.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Find an entity by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Append an entity, preserving insertion order.
    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Remove the entity with the given id. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);
        self.entities.len() != before
    }

    /// Synthesize an id for a spawn without one: `entity:NNN`, NNN = count + 1.
    pub fn next_entity_id(&self) -> String {
        format!("entity:{:03}", self.entities.len() + 1)
    }

    /// The camera record, created with a zero translation if absent.
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.camera.get_or_insert_with(Camera::default)
    }

    /// The light record, created with documented defaults if absent.
    pub fn light_mut(&mut self) -> &mut Light {
        self.light.get_or_insert_with(Light::default)
    }
}
