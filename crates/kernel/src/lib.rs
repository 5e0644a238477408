//! Scene kernel: the persisted scene document and the patch state machine.
//!
//! # Invariants
//! - All world mutations flow through [`apply_patch`].
//! - A patch that fails to resolve leaves the world untouched.

pub mod apply;
pub mod patch;
pub mod world;

pub use apply::{ApplyError, apply_patch};
pub use patch::{Patch, PatchError};
pub use world::{Camera, Entity, Light, World};
