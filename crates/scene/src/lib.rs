//! Kinematic tree: links (rigid bodies) connected by joints.
//!
//! # Invariants
//! - Link and joint names are unique within a graph.
//! - Tree edits (`add_link_with_joint`, `remove_link`, `move_joint`) are
//!   all-or-nothing: on error the graph is unchanged.
//! - Name listings follow insertion order.

mod data;
mod dot;
mod error;
mod graph;
mod joint;
mod link;
pub mod samples;

pub use data::SceneGraphData;
pub use error::SceneGraphError;
pub use graph::{JointId, LinkId, RemovedSubtree, SceneGraph};
pub use joint::{Joint, JointLimits, JointType};
pub use link::{Collision, Geometry, Inertial, Link, Visual};
