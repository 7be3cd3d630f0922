//! Contact managers: collision back ends that mirror the kinematic tree.
//!
//! A manager keeps its own set of named collision objects and an ordered
//! list of active names. It is told about structural changes; it never reads
//! the tree itself.
//!
//! # Invariants
//! - `active_collision_objects()` returns exactly the sequence last passed to
//!   `set_active_collision_objects()`.
//! - `clone_box()` yields a manager sharing no mutable state with the source.

mod cast;
mod discrete;
mod error;
mod manager;
mod object;
mod registry;

pub use cast::SimpleCastManager;
pub use discrete::SimpleDiscreteManager;
pub use error::CollisionError;
pub use manager::{ContactManager, ContinuousContactManager, DiscreteContactManager, IsContactAllowedFn};
pub use object::CollisionObject;
