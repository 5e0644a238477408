use std::time::Instant;

use glam::DVec3;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::patch::Patch;
use crate::world::{Entity, World};

/// Error raised when a patch names an operation the engine does not know.
///
/// The strict pipeline treats this as fatal for the whole invocation; the
/// permissive pipeline downgrades it to a logged skip.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("unsupported patch type `{0}`")]
    UnsupportedType(String),
}

/// A patch resolved into a typed operation.
///
/// Every optional `data` field is resolved here, before dispatch, so the
/// default table lives in one place instead of inline at each use site.
#[derive(Debug, Clone, PartialEq)]
enum PatchOp {
    SpawnEntity { id: Option<String>, kind: String },
    MoveEntity { delta: DVec3 },
    SetColor { color: Option<DVec3> },
    DeleteEntity,
    MoveCamera { delta: DVec3 },
    SetLight { intensity: Option<f64>, color: Option<DVec3> },
}

fn resolve(patch: &Patch) -> Result<PatchOp, ApplyError> {
    let data = &patch.data;
    let op = match patch.kind.as_str() {
        "spawn_entity" => PatchOp::SpawnEntity {
            id: patch.id.clone().filter(|id| !id.is_empty()),
            kind: string_field(data, "kind").unwrap_or_else(|| "cube".to_owned()),
        },
        "move_entity" => PatchOp::MoveEntity {
            delta: delta_field(data),
        },
        "set_color" => PatchOp::SetColor {
            color: color_field(data, "color"),
        },
        "delete_entity" => PatchOp::DeleteEntity,
        "move_camera" => PatchOp::MoveCamera {
            delta: delta_field(data),
        },
        "set_light" => PatchOp::SetLight {
            intensity: number_field(data, "intensity"),
            color: color_field(data, "color"),
        },
        other => return Err(ApplyError::UnsupportedType(other.to_owned())),
    };
    Ok(op)
}

fn number_field(data: &Map<String, Value>, key: &str) -> Option<f64> {
    data.get(key).and_then(Value::as_f64)
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// `dx`/`dy`/`dz`, each defaulting to 0.0.
fn delta_field(data: &Map<String, Value>) -> DVec3 {
    DVec3::new(
        number_field(data, "dx").unwrap_or(0.0),
        number_field(data, "dy").unwrap_or(0.0),
        number_field(data, "dz").unwrap_or(0.0),
    )
}

/// First 3 numeric components of an array field; `None` if the field is
/// missing, not an array, shorter than 3, or holds non-numeric entries.
fn color_field(data: &Map<String, Value>, key: &str) -> Option<DVec3> {
    let items = data.get(key)?.as_array()?;
    if items.len() < 3 {
        return None;
    }
    let mut color = [0.0; 3];
    for (slot, item) in color.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(DVec3::from_array(color))
}

/// Apply a single patch to the world.
///
/// Returns `Ok(true)` when the world was mutated and `Ok(false)` for
/// recoverable no-ops (missing target entity, unusable payload), which are
/// logged. The wall-clock duration of each call is surfaced via `tracing`.
pub fn apply_patch(world: &mut World, patch: &Patch) -> Result<bool, ApplyError> {
    let start = Instant::now();
    let op = resolve(patch)?;

    let changed = match op {
        PatchOp::SpawnEntity { id, kind } => {
            let id = id.unwrap_or_else(|| world.next_entity_id());
            world.push(Entity::new(id, kind));
            true
        }
        PatchOp::MoveEntity { delta } => match target_entity_mut(world, patch) {
            Some(entity) => {
                entity.transform.translation += delta;
                true
            }
            None => false,
        },
        PatchOp::SetColor { color: None } => {
            warn!(id = ?patch.id, "set_color payload is not a usable color, skipping");
            false
        }
        PatchOp::SetColor { color: Some(color) } => match target_entity_mut(world, patch) {
            Some(entity) => {
                entity.material.color = color;
                true
            }
            None => false,
        },
        PatchOp::DeleteEntity => match patch.id.as_deref() {
            // Deleting an id that is already gone is a no-op, not an error.
            Some(id) => world.remove(id),
            None => false,
        },
        PatchOp::MoveCamera { delta } => {
            world.camera_mut().translation += delta;
            true
        }
        PatchOp::SetLight { intensity, color } => {
            let light = world.light_mut();
            if let Some(intensity) = intensity {
                light.intensity = intensity;
            }
            if let Some(color) = color {
                light.color = color;
            }
            true
        }
    };

    debug!(
        id = ?patch.id,
        kind = %patch.kind,
        changed,
        elapsed_us = start.elapsed().as_micros() as u64,
        "patch applied"
    );
    Ok(changed)
}

fn target_entity_mut<'w>(world: &'w mut World, patch: &Patch) -> Option<&'w mut Entity> {
    let Some(id) = patch.id.as_deref() else {
        warn!(kind = %patch.kind, "patch has no target id, skipping");
        return None;
    };
    if world.get(id).is_none() {
        warn!(%id, kind = %patch.kind, "target entity not found, skipping");
        return None;
    }
    world.get_mut(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(id: Option<&str>, kind: &str, data: Value) -> Patch {
        Patch {
            id: id.map(str::to_owned),
            kind: kind.to_owned(),
            data: data.as_object().cloned().unwrap_or_default(),
        }
    }

    fn sample_world() -> World {
        let mut world = World::bootstrap();
        world.push(Entity::new("entity:cube:001", "cube"));
        world
    }

    #[test]
    fn move_entity_adds_delta_to_translation() {
        let mut world = sample_world();
        let p = patch(
            Some("entity:cube:001"),
            "move_entity",
            json!({"dx": 0.0, "dy": 1.0, "dz": 0.0}),
        );

        let changed = apply_patch(&mut world, &p).unwrap();

        assert!(changed);
        let translation = world.get("entity:cube:001").unwrap().transform.translation;
        assert_eq!(translation, DVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn move_entity_missing_components_default_to_zero() {
        let mut world = sample_world();
        let p = patch(Some("entity:cube:001"), "move_entity", json!({"dx": 2.5}));
        assert!(apply_patch(&mut world, &p).unwrap());
        let translation = world.get("entity:cube:001").unwrap().transform.translation;
        assert_eq!(translation, DVec3::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn move_entity_missing_target_is_a_noop() {
        let mut world = sample_world();
        let before = world.clone();
        let p = patch(Some("entity:ghost"), "move_entity", json!({"dy": 1.0}));
        assert!(!apply_patch(&mut world, &p).unwrap());
        assert_eq!(world, before);
    }

    #[test]
    fn set_color_replaces_material_color() {
        let mut world = sample_world();
        let p = patch(
            Some("entity:cube:001"),
            "set_color",
            json!({"color": [0.0, 1.0, 0.0]}),
        );
        assert!(apply_patch(&mut world, &p).unwrap());
        let color = world.get("entity:cube:001").unwrap().material.color;
        assert_eq!(color, DVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn set_color_truncates_to_three_components() {
        let mut world = sample_world();
        let p = patch(
            Some("entity:cube:001"),
            "set_color",
            json!({"color": [0.1, 0.2, 0.3, 0.9]}),
        );
        assert!(apply_patch(&mut world, &p).unwrap());
        let color = world.get("entity:cube:001").unwrap().material.color;
        assert_eq!(color, DVec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn set_color_short_payload_is_a_noop() {
        let mut world = sample_world();
        let before = world.clone();
        let p = patch(Some("entity:cube:001"), "set_color", json!({"color": [0.5, 0.5]}));
        assert!(!apply_patch(&mut world, &p).unwrap());
        assert_eq!(world, before);
    }

    #[test]
    fn set_color_non_numeric_payload_is_a_noop() {
        let mut world = sample_world();
        let p = patch(
            Some("entity:cube:001"),
            "set_color",
            json!({"color": ["r", "g", "b"]}),
        );
        assert!(!apply_patch(&mut world, &p).unwrap());
    }

    #[test]
    fn delete_entity_is_idempotent() {
        let mut world = sample_world();
        let p = patch(Some("entity:cube:001"), "delete_entity", json!({}));

        assert!(apply_patch(&mut world, &p).unwrap());
        assert_eq!(world.entity_count(), 0);

        // Second application: entity already absent, no-op.
        assert!(!apply_patch(&mut world, &p).unwrap());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn spawn_entity_appends_exactly_one() {
        let mut world = sample_world();
        let p = patch(Some("entity:new"), "spawn_entity", json!({"kind": "sphere"}));
        assert!(apply_patch(&mut world, &p).unwrap());
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.get("entity:new").unwrap().kind, "sphere");
    }

    #[test]
    fn spawn_entity_without_id_synthesizes_sequential_id() {
        let mut world = sample_world();
        let p = patch(None, "spawn_entity", json!({}));
        assert!(apply_patch(&mut world, &p).unwrap());
        assert!(world.get("entity:002").is_some());
        assert_eq!(world.get("entity:002").unwrap().kind, "cube");
    }

    #[test]
    fn spawn_entity_applies_field_defaults() {
        let mut world = World::default();
        let p = patch(Some("e1"), "spawn_entity", json!({}));
        apply_patch(&mut world, &p).unwrap();
        let entity = world.get("e1").unwrap();
        assert_eq!(entity.transform.scale, DVec3::ONE);
        assert_eq!(entity.material.color, DVec3::ONE);
    }

    #[test]
    fn move_camera_creates_camera_at_zero_when_absent() {
        let mut world = World::default();
        let p = patch(Some("camera"), "move_camera", json!({"dx": 1.0, "dz": -2.0}));
        assert!(apply_patch(&mut world, &p).unwrap());
        assert_eq!(
            world.camera.unwrap().translation,
            DVec3::new(1.0, 0.0, -2.0)
        );
    }

    #[test]
    fn move_camera_accumulates_on_existing_camera() {
        let mut world = World::bootstrap();
        let p = patch(Some("camera"), "move_camera", json!({"dy": -5.0}));
        apply_patch(&mut world, &p).unwrap();
        assert_eq!(
            world.camera.unwrap().translation,
            DVec3::new(0.0, 0.0, 10.0)
        );
    }

    #[test]
    fn set_light_merges_fields_and_creates_defaults() {
        let mut world = World::default();
        let p = patch(Some("light"), "set_light", json!({"intensity": 2.5}));
        assert!(apply_patch(&mut world, &p).unwrap());
        let light = world.light.unwrap();
        assert_eq!(light.intensity, 2.5);
        // Color untouched by this patch keeps the default.
        assert_eq!(light.color, DVec3::ONE);

        let p = patch(Some("light"), "set_light", json!({"color": [1.0, 0.0, 0.0, 0.5]}));
        apply_patch(&mut world, &p).unwrap();
        let light = world.light.unwrap();
        assert_eq!(light.color, DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(light.intensity, 2.5);
    }

    #[test]
    fn unknown_patch_type_is_an_error_and_leaves_world_unchanged() {
        let mut world = sample_world();
        let before = world.clone();
        let p = patch(Some("entity:cube:001"), "levitate", json!({}));

        let err = apply_patch(&mut world, &p).unwrap_err();
        assert!(matches!(err, ApplyError::UnsupportedType(ref t) if t == "levitate"));
        assert_eq!(err.to_string(), "unsupported patch type `levitate`");
        assert_eq!(world, before);
    }
}
