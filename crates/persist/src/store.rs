//! File-backed persistence for the scene document.
//!
//! The world file is a single pretty-printed JSON document, overwritten in
//! full on every save. There is no locking: this process is the only writer
//! under the documented usage model, and a concurrent external writer is a
//! last-write-wins race outside the correctness guarantees.

use std::fs;
use std::path::Path;

use scenepatch_kernel::{Patch, PatchError, World};
use tracing::info;

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),
}

/// Load the world file at `path`.
///
/// If the file does not exist, the bootstrap world is synthesized, written
/// to disk (creating parent directories as needed), and returned. Malformed
/// JSON in an existing file propagates as a parse error.
pub fn load_world(path: &Path) -> Result<World, StoreError> {
    if !path.exists() {
        let world = World::bootstrap();
        save_world(path, &world)?;
        info!(path = %path.display(), "world file missing, wrote bootstrap world");
        return Ok(world);
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Serialize and overwrite the world file at `path`, creating parent
/// directories as needed. Always a full overwrite.
pub fn save_world(path: &Path, world: &World) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut text = serde_json::to_string_pretty(world)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

// Shared by the patch loaders in `patches`; a patch source is either one
// patch object or a list of them.
pub(crate) fn collect_patches(payload: &serde_json::Value) -> Result<Vec<Patch>, StoreError> {
    match payload {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| Patch::parse(item).map_err(StoreError::from))
            .collect(),
        other => Ok(vec![Patch::parse(other)?]),
    }
}
