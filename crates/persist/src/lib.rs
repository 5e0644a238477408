//! Persistence: JSON world-file store and patch-source loading.
//!
//! # Invariants
//! - World saves are always a full-file overwrite, never a partial merge.
//! - A corrupt world file propagates a parse error; it is not self-healing.
//! - Patch sources are loaded strictly (one-shot pipeline) or leniently
//!   (watch/simulate), never a mix within one load.

pub mod patches;
pub mod store;

pub use patches::{clear_patch_file, discover_patch_files, load_patches, load_patches_lenient};
pub use store::{StoreError, load_world, save_world};
