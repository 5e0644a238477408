use std::path::{Path, PathBuf};
use std::time::Instant;

use scenepatch_kernel::{ApplyError, World, apply_patch};
use scenepatch_persist::{self as persist, StoreError};
use tracing::info;

/// Errors from pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Strict one-shot pipeline.
///
/// Loads the world (fatal on a corrupt file), loads every patch source
/// strictly (load-then-apply: nothing is applied unless all patches parse),
/// applies them in order (fatal on an unsupported type), and persists the
/// world once at the end. Per-patch and per-frame timings go to the log.
pub fn apply_once(world_path: &Path, patch_paths: &[PathBuf]) -> Result<World, RuntimeError> {
    let mut world = persist::load_world(world_path)?;
    let patches = persist::load_patches(patch_paths)?;

    let frame_start = Instant::now();
    for patch in &patches {
        let start = Instant::now();
        apply_patch(&mut world, patch)?;
        info!(
            id = ?patch.id,
            kind = %patch.kind,
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "applied patch"
        );
    }
    persist::save_world(world_path, &world)?;
    info!(
        patches = patches.len(),
        elapsed_ms = frame_start.elapsed().as_secs_f64() * 1e3,
        "frame processed"
    );
    Ok(world)
}

/// Per-patch outcome from a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    /// Skipped, with a human-readable reason.
    Skipped(String),
}

/// One line of the simulation report.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResult {
    pub id: Option<String>,
    pub kind: String,
    pub outcome: Outcome,
}

/// Outcomes of a full simulation run, in patch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub results: Vec<PatchResult>,
}

impl SimulationReport {
    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Applied)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results.len() - self.applied()
    }
}

/// Permissive single-pass pipeline.
///
/// The world file is still loaded strictly (a corrupt world is not
/// self-healing), but the patch source is loaded leniently and every apply
/// failure is downgraded to a skipped entry in the report. The world is
/// persisted once at the end; the patch file is left untouched.
pub fn simulate(world_path: &Path, patch_path: &Path) -> Result<SimulationReport, RuntimeError> {
    let mut world = persist::load_world(world_path)?;
    let patches = persist::load_patches_lenient(patch_path);

    let mut report = SimulationReport::default();
    for patch in &patches {
        let outcome = match apply_patch(&mut world, patch) {
            Ok(true) => Outcome::Applied,
            Ok(false) => Outcome::Skipped("no effect".to_owned()),
            Err(err) => Outcome::Skipped(err.to_string()),
        };
        report.results.push(PatchResult {
            id: patch.id.clone(),
            kind: patch.kind.clone(),
            outcome,
        });
    }
    persist::save_world(world_path, &world)?;
    Ok(report)
}
