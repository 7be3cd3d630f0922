//! Ready-made kinematic trees for demos and tests.

use glam::DVec3;
use kinspace_common::Pose;

use crate::error::SceneGraphError;
use crate::graph::SceneGraph;
use crate::joint::{Joint, JointLimits};
use crate::link::{Collision, Geometry, Link};

/// Serial arm `base_link -> link_1 -> ... -> link_<dof> -> tool0`.
///
/// Joints `joint_a1..joint_a<dof>` are revolute, alternating Z and Y axes,
/// and `tool0` hangs off the last link by the fixed `joint_tool0`. Every
/// link except `tool0` carries a cylinder collision shape.
pub fn serial_arm(dof: usize) -> Result<SceneGraph, SceneGraphError> {
    let mut graph = SceneGraph::new(format!("serial_arm_{dof}"));
    let shell = |name: &str| {
        Link::new(name).with_collision(Collision::new(Geometry::Cylinder {
            radius: 0.06,
            length: 0.2,
        }))
    };

    graph.add_link(shell("base_link"))?;
    graph.set_root("base_link")?;
    let mut parent = "base_link".to_string();
    for i in 1..=dof {
        let child = format!("link_{i}");
        let axis = if i % 2 == 1 { DVec3::Z } else { DVec3::Y };
        let joint = Joint::revolute(format!("joint_a{i}"), parent.clone(), child.clone(), axis)
            .with_origin(Pose::from_translation(DVec3::new(0.0, 0.0, 0.2)))
            .with_limits(JointLimits::new(-2.96, 2.96));
        graph.add_link_with_joint(shell(&child), Some(joint))?;
        parent = child;
    }
    graph.add_link_with_joint(
        Link::new("tool0"),
        Some(
            Joint::fixed("joint_tool0", parent, "tool0")
                .with_origin(Pose::from_translation(DVec3::new(0.0, 0.0, 0.126))),
        ),
    )?;
    graph.validate_tree()?;
    Ok(graph)
}
