use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};

use scenepatch_kernel::{World, apply_patch};
use scenepatch_persist as persist;
use tracing::{debug, info, warn};

use crate::pipeline::RuntimeError;

/// Shared flag asking a running watcher to stop after its current cycle.
///
/// Clones observe the same flag, so a handle can be moved to a signal
/// handler or another thread while the watcher keeps one.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Polling watcher over an external patch file.
///
/// Two states: idle (no unprocessed change) and applying. A cycle leaves
/// idle when the patch file's mtime is strictly newer than the last one
/// observed, or when no mtime has been observed yet; the first sighting of
/// a pre-existing file therefore triggers an apply. Consumption ends by
/// rewriting the file to `[]` and refreshing the observed mtime.
pub struct Watcher {
    world_path: PathBuf,
    patch_path: PathBuf,
    interval: Duration,
    last_seen: Option<SystemTime>,
    world: World,
}

impl Watcher {
    /// Load the world once and prepare to poll `patch_path`.
    pub fn new(
        world_path: PathBuf,
        patch_path: PathBuf,
        interval: Duration,
    ) -> Result<Self, RuntimeError> {
        let world = persist::load_world(&world_path)?;
        Ok(Self {
            world_path,
            patch_path,
            interval,
            last_seen: None,
            world,
        })
    }

    /// The in-memory world as of the last completed cycle.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Poll until the stop handle fires. Never returns on its own otherwise.
    pub fn run(&mut self, stop: &StopHandle) -> Result<(), RuntimeError> {
        info!(
            patch = %self.patch_path.display(),
            interval_ms = self.interval.as_millis() as u64,
            "watching for patches"
        );
        while !stop.is_stopped() {
            self.poll_once()?;
            std::thread::sleep(self.interval);
        }
        info!("watcher stopped");
        Ok(())
    }

    /// One poll cycle: check the patch file and consume it when newer.
    ///
    /// An absent file is idle, not an error.
    pub fn poll_once(&mut self) -> Result<(), RuntimeError> {
        let Ok(meta) = fs::metadata(&self.patch_path) else {
            debug!(patch = %self.patch_path.display(), "patch file absent, staying idle");
            return Ok(());
        };
        let modified = meta.modified().map_err(persist::StoreError::from)?;
        if let Some(last_seen) = self.last_seen {
            if modified <= last_seen {
                return Ok(());
            }
        }

        self.consume()?;
        self.mark_consumed()
    }

    // Read and apply everything currently in the patch file. The world file
    // is rewritten after every patch so a downstream reader always sees
    // progress, even mid-batch.
    fn consume(&mut self) -> Result<(), RuntimeError> {
        let patches = persist::load_patches_lenient(&self.patch_path);
        if patches.is_empty() {
            debug!("no patches parsed, skipping mutation");
            return Ok(());
        }
        for patch in &patches {
            let start = Instant::now();
            match apply_patch(&mut self.world, patch) {
                Ok(changed) => {
                    persist::save_world(&self.world_path, &self.world)?;
                    info!(
                        id = ?patch.id,
                        kind = %patch.kind,
                        changed,
                        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
                        "applied patch"
                    );
                }
                Err(err) => warn!(%err, "skipping patch"),
            }
        }
        Ok(())
    }

    // Rewrite the consumed file to `[]` and remember its new mtime. A patch
    // the producer writes between `consume` and this rewrite is lost (see
    // the crate docs).
    fn mark_consumed(&mut self) -> Result<(), RuntimeError> {
        persist::clear_patch_file(&self.patch_path)?;
        let meta = fs::metadata(&self.patch_path).map_err(persist::StoreError::from)?;
        self.last_seen = Some(meta.modified().map_err(persist::StoreError::from)?);
        Ok(())
    }
}
