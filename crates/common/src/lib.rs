//! Shared types and utilities for the kinspace workspace.
//!
//! # Invariants
//! - `Pose` is always a rigid transform (unit rotation, no scale).
//! - Resource resolution never consults process-global state.

pub mod locator;
pub mod types;

pub use locator::{LocatorError, PackageLocator, ResourceLocator};
pub use types::Pose;
