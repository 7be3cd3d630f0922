use std::collections::{HashMap, HashSet, VecDeque};

use kinspace_common::Pose;
use slotmap::{new_key_type, SlotMap};

use crate::error::SceneGraphError;
use crate::joint::Joint;
use crate::link::Link;

new_key_type! {
    /// Stable arena key of a link node.
    pub struct LinkId;
    /// Stable arena key of a joint node.
    pub struct JointId;
}

#[derive(Debug, Clone)]
struct LinkNode {
    link: Link,
    /// More than one entry only in malformed graphs; `validate_tree` rejects it.
    parent_joints: Vec<JointId>,
    child_joints: Vec<JointId>,
}

#[derive(Debug, Clone)]
struct JointNode {
    joint: Joint,
    parent: LinkId,
    child: LinkId,
}

/// Links and joints removed by a cascading [`SceneGraph::remove_link`].
#[derive(Debug, Clone, Default)]
pub struct RemovedSubtree {
    /// Removed links, the requested link first, then its descendants in
    /// depth-first order.
    pub links: Vec<Link>,
    pub joints: Vec<Joint>,
}

impl RemovedSubtree {
    pub fn link_names(&self) -> Vec<String> {
        self.links.iter().map(|l| l.name.clone()).collect()
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.joints.iter().map(|j| j.name.clone()).collect()
    }
}

/// Kinematic graph of links (nodes) and joints (directed parent → child edges).
///
/// Storage is a pair of slot-map arenas with index-based parent/child
/// relations and name indices; there is no shared ownership between nodes.
///
/// The primitives [`add_link`](Self::add_link) and [`add_joint`](Self::add_joint)
/// only enforce unique names and existing endpoints, so malformed input
/// (several roots, a link with two parents, cycles) can be represented and
/// then rejected by [`validate_tree`](Self::validate_tree). The tree edits
/// assume a valid tree and keep it valid.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    name: String,
    root: Option<LinkId>,
    links: SlotMap<LinkId, LinkNode>,
    joints: SlotMap<JointId, JointNode>,
    link_index: HashMap<String, LinkId>,
    joint_index: HashMap<String, JointId>,
    link_order: Vec<LinkId>,
    joint_order: Vec<JointId>,
}

impl SceneGraph {
    /// Prefix of the fixed joint synthesized when a link is added without one.
    pub const DEFAULT_JOINT_PREFIX: &'static str = "joint_";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // --- Graph primitives ---

    /// Insert a link with no joints attached.
    pub fn add_link(&mut self, link: Link) -> Result<LinkId, SceneGraphError> {
        if self.link_index.contains_key(&link.name) {
            return Err(SceneGraphError::DuplicateLink(link.name));
        }
        let name = link.name.clone();
        let id = self.links.insert(LinkNode {
            link,
            parent_joints: Vec::new(),
            child_joints: Vec::new(),
        });
        self.link_index.insert(name, id);
        self.link_order.push(id);
        Ok(id)
    }

    /// Insert a joint between two existing links.
    ///
    /// Does not check tree shape; see [`validate_tree`](Self::validate_tree).
    pub fn add_joint(&mut self, joint: Joint) -> Result<JointId, SceneGraphError> {
        if self.joint_index.contains_key(&joint.name) {
            return Err(SceneGraphError::DuplicateJoint(joint.name));
        }
        let parent = self.link_id(&joint.parent_link_name)?;
        let child = self.link_id(&joint.child_link_name)?;
        let name = joint.name.clone();
        let id = self.joints.insert(JointNode {
            joint,
            parent,
            child,
        });
        self.links[parent].child_joints.push(id);
        self.links[child].parent_joints.push(id);
        self.joint_index.insert(name, id);
        self.joint_order.push(id);
        Ok(id)
    }

    pub fn set_root(&mut self, name: &str) -> Result<(), SceneGraphError> {
        self.root = Some(self.link_id(name)?);
        Ok(())
    }

    // --- Queries ---

    pub fn root_link_name(&self) -> Option<&str> {
        self.root.map(|id| self.links[id].link.name.as_str())
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.link_index.get(name).map(|id| &self.links[*id].link)
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_index.get(name).map(|id| &self.joints[*id].joint)
    }

    pub fn contains_link(&self, name: &str) -> bool {
        self.link_index.contains_key(name)
    }

    pub fn contains_joint(&self, name: &str) -> bool {
        self.joint_index.contains_key(name)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.link_order.iter().map(|id| &self.links[*id].link)
    }

    /// Joints in insertion order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> + '_ {
        self.joint_order.iter().map(|id| &self.joints[*id].joint)
    }

    pub fn link_names(&self) -> Vec<String> {
        self.links().map(|l| l.name.clone()).collect()
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.joints().map(|j| j.name.clone()).collect()
    }

    /// The joint whose child is `link`, if any.
    pub fn parent_joint(&self, link: &str) -> Option<&Joint> {
        let id = self.link_index.get(link)?;
        self.links[*id]
            .parent_joints
            .first()
            .map(|j| &self.joints[*j].joint)
    }

    /// Joints whose parent is `link`, in attachment order.
    pub fn child_joints(&self, link: &str) -> Vec<&Joint> {
        self.link_index
            .get(link)
            .map(|id| {
                self.links[*id]
                    .child_joints
                    .iter()
                    .map(|j| &self.joints[*j].joint)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every link below `link`, depth-first, excluding `link` itself.
    pub fn child_link_names(&self, link: &str) -> Vec<String> {
        let Some(id) = self.link_index.get(link) else {
            return Vec::new();
        };
        self.subtree_ids(*id)
            .into_iter()
            .skip(1)
            .map(|id| self.links[id].link.name.clone())
            .collect()
    }

    /// Parent link and direct child links of `link`.
    pub fn adjacent_link_names(&self, link: &str) -> Vec<String> {
        let Some(id) = self.link_index.get(link) else {
            return Vec::new();
        };
        let node = &self.links[*id];
        node.parent_joints
            .iter()
            .map(|j| self.joints[*j].parent)
            .chain(node.child_joints.iter().map(|j| self.joints[*j].child))
            .map(|l| self.links[l].link.name.clone())
            .collect()
    }

    /// All links reachable from the root in depth-first pre-order, children
    /// visited in joint attachment order.
    pub fn depth_first_link_names(&self) -> Vec<String> {
        self.root
            .map(|root| {
                self.subtree_ids(root)
                    .into_iter()
                    .map(|id| self.links[id].link.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Visit every link reachable from the root in depth-first pre-order,
    /// passing the link and the joint that attaches it (`None` for the root).
    pub fn visit_depth_first<F>(&self, mut visit: F)
    where
        F: FnMut(&Link, Option<&Joint>),
    {
        let Some(root) = self.root else {
            return;
        };
        for id in self.subtree_ids(root) {
            let node = &self.links[id];
            let joint = node.parent_joints.first().map(|j| &self.joints[*j].joint);
            visit(&node.link, if id == root { None } else { joint });
        }
    }

    // --- Validation ---

    /// Check the tree invariants: a root is set, it is the only link without
    /// a parent joint, no link has two parents, there are no cycles, and every
    /// link is reachable from the root.
    pub fn validate_tree(&self) -> Result<(), SceneGraphError> {
        let root = self.root.ok_or(SceneGraphError::MissingRoot)?;

        for id in &self.link_order {
            let node = &self.links[*id];
            if node.parent_joints.len() > 1 {
                return Err(SceneGraphError::MultipleParents(node.link.name.clone()));
            }
        }

        if !self.links[root].parent_joints.is_empty() {
            return Err(SceneGraphError::RootHasParent(
                self.links[root].link.name.clone(),
            ));
        }

        let extra_roots: Vec<String> = self
            .link_order
            .iter()
            .filter(|id| **id != root && self.links[**id].parent_joints.is_empty())
            .map(|id| self.links[*id].link.name.clone())
            .collect();
        if !extra_roots.is_empty() {
            return Err(SceneGraphError::MultipleRoots(extra_roots));
        }

        if let Some(id) = self.find_cycle() {
            return Err(SceneGraphError::Cycle(self.links[id].link.name.clone()));
        }

        let reachable: HashSet<LinkId> = self.subtree_ids(root).into_iter().collect();
        if let Some(id) = self.link_order.iter().find(|id| !reachable.contains(id)) {
            return Err(SceneGraphError::Unreachable(self.links[*id].link.name.clone()));
        }
        Ok(())
    }

    pub fn is_tree(&self) -> bool {
        self.validate_tree().is_ok()
    }

    pub fn is_acyclic(&self) -> bool {
        self.find_cycle().is_none()
    }

    /// First link (in insertion order) that lies on or below a cycle, found
    /// by peeling off links whose parents are all resolved.
    fn find_cycle(&self) -> Option<LinkId> {
        let mut pending: HashMap<LinkId, usize> = self
            .links
            .iter()
            .map(|(id, node)| (id, node.parent_joints.len()))
            .collect();
        let mut queue: VecDeque<LinkId> = self
            .link_order
            .iter()
            .copied()
            .filter(|id| pending[id] == 0)
            .collect();
        while let Some(id) = queue.pop_front() {
            pending.remove(&id);
            for joint in &self.links[id].child_joints {
                let child = self.joints[*joint].child;
                if let Some(count) = pending.get_mut(&child) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }
        self.link_order
            .iter()
            .copied()
            .find(|id| pending.contains_key(id))
    }

    // --- Tree edits ---

    /// The fixed joint that attaches `link_name` to the root when no joint is
    /// given: named `prefix + link_name`, identity origin.
    pub fn default_joint(&self, link_name: &str, prefix: &str) -> Result<Joint, SceneGraphError> {
        let root = self.root_link_name().ok_or(SceneGraphError::MissingRoot)?;
        Ok(Joint::fixed(format!("{prefix}{link_name}"), root, link_name))
    }

    /// Attach a new link to the tree.
    ///
    /// With `joint == None` a fixed joint named `"joint_" + link.name` to the
    /// root is synthesized. Nothing changes on error.
    pub fn add_link_with_joint(
        &mut self,
        link: Link,
        joint: Option<Joint>,
    ) -> Result<(), SceneGraphError> {
        let joint = match joint {
            Some(joint) => joint,
            None => self.default_joint(&link.name, Self::DEFAULT_JOINT_PREFIX)?,
        };
        if self.link_index.contains_key(&link.name) {
            return Err(SceneGraphError::DuplicateLink(link.name));
        }
        if self.joint_index.contains_key(&joint.name) {
            return Err(SceneGraphError::DuplicateJoint(joint.name));
        }
        if joint.child_link_name != link.name {
            return Err(SceneGraphError::ChildMismatch {
                joint: joint.name,
                child: joint.child_link_name,
                link: link.name,
            });
        }
        if !self.link_index.contains_key(&joint.parent_link_name) {
            return Err(SceneGraphError::LinkNotFound(joint.parent_link_name));
        }

        self.add_link(link)?;
        self.add_joint(joint)?;
        Ok(())
    }

    /// Remove a link together with its parent joint and its whole subtree.
    pub fn remove_link(&mut self, name: &str) -> Result<RemovedSubtree, SceneGraphError> {
        let id = self.link_id(name)?;
        if self.root == Some(id) {
            return Err(SceneGraphError::RemoveRoot(name.to_string()));
        }

        let subtree = self.subtree_ids(id);
        let doomed_links: HashSet<LinkId> = subtree.iter().copied().collect();
        let mut doomed_joints: Vec<JointId> = Vec::new();
        for link in &subtree {
            let node = &self.links[*link];
            for joint in node.parent_joints.iter().chain(&node.child_joints) {
                if !doomed_joints.contains(joint) {
                    doomed_joints.push(*joint);
                }
            }
        }

        let mut removed = RemovedSubtree::default();
        for joint_id in &doomed_joints {
            let Some(node) = self.joints.remove(*joint_id) else {
                continue;
            };
            if !doomed_links.contains(&node.parent) {
                self.links[node.parent]
                    .child_joints
                    .retain(|j| j != joint_id);
            }
            if !doomed_links.contains(&node.child) {
                self.links[node.child]
                    .parent_joints
                    .retain(|j| j != joint_id);
            }
            self.joint_index.remove(&node.joint.name);
            removed.joints.push(node.joint);
        }
        for link_id in &subtree {
            if let Some(node) = self.links.remove(*link_id) {
                self.link_index.remove(&node.link.name);
                removed.links.push(node.link);
            }
        }

        let doomed_joints: HashSet<JointId> = doomed_joints.into_iter().collect();
        self.joint_order.retain(|j| !doomed_joints.contains(j));
        self.link_order.retain(|l| !doomed_links.contains(l));
        tracing::trace!(
            link = name,
            links = removed.links.len(),
            joints = removed.joints.len(),
            "removed subtree"
        );
        Ok(removed)
    }

    /// Re-parent `joint_name` (and everything below it) under `new_parent`.
    ///
    /// The joint's origin and the descendant structure are kept as they are.
    pub fn move_joint(&mut self, joint_name: &str, new_parent: &str) -> Result<(), SceneGraphError> {
        let joint_id = self.joint_id(joint_name)?;
        let parent_id = self.link_id(new_parent)?;
        let child_id = self.joints[joint_id].child;
        if self.subtree_ids(child_id).contains(&parent_id) {
            return Err(SceneGraphError::WouldCreateCycle {
                joint: joint_name.to_string(),
                parent: new_parent.to_string(),
            });
        }

        let old_parent = self.joints[joint_id].parent;
        self.links[old_parent]
            .child_joints
            .retain(|j| *j != joint_id);
        self.links[parent_id].child_joints.push(joint_id);
        let node = &mut self.joints[joint_id];
        node.parent = parent_id;
        node.joint.parent_link_name = new_parent.to_string();
        tracing::trace!(joint = joint_name, parent = new_parent, "moved joint");
        Ok(())
    }

    /// Replace the static parent-to-joint transform of a joint.
    pub fn change_joint_origin(&mut self, joint_name: &str, origin: Pose) -> Result<(), SceneGraphError> {
        let id = self.joint_id(joint_name)?;
        self.joints[id].joint.parent_to_joint_origin_transform = origin;
        Ok(())
    }

    // --- Internals ---

    fn link_id(&self, name: &str) -> Result<LinkId, SceneGraphError> {
        self.link_index
            .get(name)
            .copied()
            .ok_or_else(|| SceneGraphError::LinkNotFound(name.to_string()))
    }

    fn joint_id(&self, name: &str) -> Result<JointId, SceneGraphError> {
        self.joint_index
            .get(name)
            .copied()
            .ok_or_else(|| SceneGraphError::JointNotFound(name.to_string()))
    }

    /// `start` and everything below it in depth-first pre-order. Each link is
    /// visited once even if the graph is malformed.
    fn subtree_ids(&self, start: LinkId) -> Vec<LinkId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            for joint in self.links[id].child_joints.iter().rev() {
                stack.push(self.joints[*joint].child);
            }
        }
        out
    }
}
