//! Shared types for the scenepatch runtime.

pub mod types;

pub use types::{Material, Transform};
