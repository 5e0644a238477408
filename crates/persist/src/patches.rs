//! Patch-source loading and consumption.
//!
//! Patch files carry either a single patch object or a list of patch
//! objects. The strict loader is used by the one-shot pipeline
//! (load-then-apply: every entry must parse before anything is applied);
//! the lenient loader backs watch/simulate and downgrades every failure on
//! the patch source to a logged skip.

use std::fs;
use std::path::{Path, PathBuf};

use scenepatch_kernel::Patch;
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::{StoreError, collect_patches};

/// Load patches from one or more sources, flattened in the order given.
///
/// Strict: an unreadable file, malformed JSON, or a malformed entry fails
/// the whole load.
pub fn load_patches(paths: &[PathBuf]) -> Result<Vec<Patch>, StoreError> {
    let mut patches = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path)?;
        let payload: Value = serde_json::from_str(&text)?;
        patches.extend(collect_patches(&payload)?);
    }
    Ok(patches)
}

/// Lenient load for the watch/simulate pipelines.
///
/// Unreadable files and malformed JSON are treated as "no patches";
/// malformed entries are dropped. Everything downgraded is logged.
pub fn load_patches_lenient(path: &Path) -> Vec<Patch> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), %err, "cannot read patch file, treating as empty");
            return Vec::new();
        }
    };
    let payload: Value = match serde_json::from_str(&text) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(path = %path.display(), %err, "patch file is not valid JSON, treating as empty");
            return Vec::new();
        }
    };

    let entries = match payload {
        Value::Array(items) => items,
        other => vec![other],
    };
    entries
        .iter()
        .filter_map(|raw| {
            let patch = Patch::parse_lenient(raw);
            if patch.is_none() {
                warn!(path = %path.display(), "dropping malformed patch entry");
            }
            patch
        })
        .collect()
}

/// Rewrite a consumed patch file to an empty list, signaling the producer.
pub fn clear_patch_file(path: &Path) -> Result<(), StoreError> {
    fs::write(path, "[]\n")?;
    Ok(())
}

/// Resolve patch inputs: explicit paths win verbatim, in the order given;
/// otherwise `patch_dir` is scanned for `*.json` files in sorted order.
pub fn discover_patch_files(explicit: &[PathBuf], patch_dir: Option<&Path>) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let Some(dir) = patch_dir else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(dir) else {
        debug!(dir = %dir.display(), "patch directory not readable, no patches discovered");
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
