use std::collections::HashSet;

use kinspace_scene::SceneGraph;

/// Links that move when some joint moves, in depth-first pre-order from the
/// root with children in attachment order.
///
/// A link is active when its parent joint is not fixed, or when its parent
/// link is active. The root is never active.
pub fn compute_active_links(graph: &SceneGraph) -> Vec<String> {
    let mut active = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    graph.visit_depth_first(|link, joint| {
        let Some(joint) = joint else {
            return;
        };
        if joint.joint_type.is_movable() || seen.contains(&joint.parent_link_name) {
            seen.insert(link.name.clone());
            active.push(link.name.clone());
        }
    });
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use kinspace_scene::samples::serial_arm;
    use kinspace_scene::{Joint, Link};

    #[test]
    fn arm_links_below_first_joint_are_active() {
        let active = compute_active_links(&serial_arm(3).unwrap());
        assert_eq!(active, vec!["link_1", "link_2", "link_3", "tool0"]);
    }

    #[test]
    fn fixed_children_of_root_stay_static() {
        let mut graph = serial_arm(1).unwrap();
        graph
            .add_link_with_joint(Link::new("pedestal"), None)
            .unwrap();
        graph
            .add_link_with_joint(
                Link::new("camera"),
                Some(Joint::fixed("joint_camera", "pedestal", "camera")),
            )
            .unwrap();
        assert_eq!(compute_active_links(&graph), vec!["link_1", "tool0"]);
    }

    #[test]
    fn movable_joint_below_static_branch() {
        let mut graph = serial_arm(1).unwrap();
        graph
            .add_link_with_joint(Link::new("pedestal"), None)
            .unwrap();
        graph
            .add_link_with_joint(
                Link::new("turntable"),
                Some(Joint::revolute("joint_turntable", "pedestal", "turntable", DVec3::Z)),
            )
            .unwrap();
        assert_eq!(
            compute_active_links(&graph),
            vec!["link_1", "tool0", "turntable"]
        );
    }

    #[test]
    fn empty_graph_has_no_active_links() {
        assert!(compute_active_links(&SceneGraph::default()).is_empty());
    }
}
