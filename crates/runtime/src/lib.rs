//! Runtime: the pipelines that move patches from disk into the world file.
//!
//! # Invariants
//! - The strict pipeline is all-or-nothing per invocation: load every patch,
//!   then apply; any failure aborts before the world file is rewritten.
//! - The watch loop persists the world after every single patch so the
//!   on-disk file stays continuously consumable by a downstream reader.
//! - Consuming a patch file always ends by rewriting it to `[]`.
//!
//! # Known race
//! The watch loop's read-then-clear of the patch file is not atomic with
//! respect to the producer: a patch written into the file between the read
//! and the rewrite is silently dropped. Accepted limitation of the
//! file-hand-off protocol; see the test exercising the window.

pub mod pipeline;
pub mod watch;

pub use pipeline::{Outcome, PatchResult, RuntimeError, SimulationReport, apply_once, simulate};
pub use watch::{StopHandle, Watcher};
