use std::collections::BTreeSet;

use kinspace_collision::{
    CollisionError, CollisionObject, ContactManager, ContinuousContactManager,
    DiscreteContactManager,
};
use kinspace_common::Pose;
use kinspace_scene::{Joint, Link, RemovedSubtree, SceneGraph, SceneGraphData};

use crate::acm::AllowedCollisionMatrix;
use crate::active::compute_active_links;
use crate::config::EnvironmentConfig;
use crate::error::EnvironmentError;
use crate::event::EnvironmentEvent;

/// Reason recorded for parent/child pairs allowed by
/// [`Environment::add_adjacent_allowed_collisions`].
pub const ADJACENT_REASON: &str = "Adjacent";

/// The authoritative kinematic environment.
///
/// Owns the tree, the allowed collision matrix and the attached contact
/// managers, and is the only place structural edits happen. Every successful
/// edit recomputes the active links and forwards the change to the discrete
/// manager, then the continuous one.
///
/// Cloning deep-copies everything, managers included (through `clone_box`),
/// so a clone can be handed to another thread and edited independently.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    config: EnvironmentConfig,
    /// `None` until `init` succeeds.
    graph: Option<SceneGraph>,
    acm: AllowedCollisionMatrix,
    disabled_links: BTreeSet<String>,
    active_links: Vec<String>,
    discrete: Option<Box<dyn DiscreteContactManager>>,
    continuous: Option<Box<dyn ContinuousContactManager>>,
    event_log: Vec<EnvironmentEvent>,
    revision: u64,
}

/// Delta forwarded to each attached manager after an edit.
#[derive(Default)]
struct ManagerUpdate {
    /// Drop every object the manager holds before applying the rest.
    reset: bool,
    remove: Vec<String>,
    add: Vec<CollisionObject>,
}

impl ManagerUpdate {
    fn apply<M>(&self, kind: &str, manager: &mut M, active: &[String])
    where
        M: ContactManager + ?Sized,
    {
        if self.reset {
            for name in manager.collision_object_names() {
                manager.remove_collision_object(&name);
            }
        }
        for name in &self.remove {
            if manager.remove_collision_object(name) {
                tracing::trace!(manager = kind, link = %name, "removed collision object");
            }
        }
        for object in &self.add {
            match manager.add_collision_object(object.clone()) {
                Ok(()) => {
                    tracing::trace!(manager = kind, link = %object.name, "added collision object")
                }
                Err(e) => tracing::error!(
                    manager = kind,
                    link = %object.name,
                    error = %e,
                    "contact manager rejected collision object"
                ),
            }
        }
        manager.set_active_collision_objects(active);
    }
}

/// The collision object for `link`, disabled if its name is in `disabled`.
fn object_for(
    link: &Link,
    disabled: &BTreeSet<String>,
) -> Result<Option<CollisionObject>, CollisionError> {
    Ok(CollisionObject::from_link(link)?
        .map(|object| object.with_enabled(!disabled.contains(&link.name))))
}

fn objects_for<'a>(
    links: impl Iterator<Item = &'a Link>,
    disabled: &BTreeSet<String>,
) -> Result<Vec<CollisionObject>, CollisionError> {
    let mut objects = Vec::new();
    for link in links {
        if let Some(object) = object_for(link, disabled)? {
            objects.push(object);
        }
    }
    Ok(objects)
}

impl Environment {
    /// An uninitialized environment.
    pub fn new(config: EnvironmentConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    // --- Lifecycle ---

    /// Install `graph` as the environment's tree.
    ///
    /// The graph must satisfy the tree invariants and every link's collision
    /// geometry must be valid; otherwise nothing changes. On success any
    /// earlier state is reset: the matrix, the disabled links and the event
    /// log are cleared and attached managers are rebuilt from the new tree.
    pub fn init(&mut self, graph: SceneGraph) -> Result<(), EnvironmentError> {
        let _span = tracing::info_span!("environment_init", name = graph.name()).entered();
        if let Err(e) = graph.validate_tree() {
            tracing::warn!(error = %e, "rejected scene graph");
            return Err(e.into());
        }
        let objects = match objects_for(graph.links(), &BTreeSet::new()) {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!(error = %e, "rejected collision geometry");
                return Err(e.into());
            }
        };

        let event = EnvironmentEvent::Initialized {
            name: graph.name().to_string(),
            links: graph.link_count(),
            joints: graph.joint_count(),
        };
        self.acm.clear_allowed_collisions();
        self.disabled_links.clear();
        self.event_log.clear();
        if self.config.allow_adjacent_on_init {
            for joint in graph.joints() {
                self.acm.add_allowed_collision(
                    &joint.parent_link_name,
                    &joint.child_link_name,
                    ADJACENT_REASON,
                );
            }
        }
        self.active_links = compute_active_links(&graph);
        self.graph = Some(graph);
        self.record(event);

        self.push_allowed_fn();
        self.push_update(&ManagerUpdate {
            reset: true,
            add: objects,
            ..ManagerUpdate::default()
        });
        tracing::info!(
            links = self.link_count(),
            active = self.active_links.len(),
            "environment initialized"
        );
        Ok(())
    }

    /// Assemble `data` into a graph and [`init`](Self::init) with it.
    /// Duplicate names and joints with unknown endpoints fail here.
    pub fn init_from_description(&mut self, data: SceneGraphData) -> Result<(), EnvironmentError> {
        let graph = SceneGraph::try_from(data).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected scene description");
        })?;
        self.init(graph)
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    // --- Tree edits ---

    /// Attach `link` to the tree.
    ///
    /// Without a joint, a fixed joint named by the configured prefix plus the
    /// link name connects it to the root.
    pub fn add_link(&mut self, link: Link, joint: Option<Joint>) -> Result<(), EnvironmentError> {
        let graph = self.graph.as_mut().ok_or(EnvironmentError::NotInitialized)?;
        let object = object_for(&link, &self.disabled_links).inspect_err(|e| {
            tracing::warn!(link = %link.name, error = %e, "rejected collision geometry");
        })?;
        let joint = match joint {
            Some(joint) => joint,
            None => graph.default_joint(&link.name, &self.config.default_joint_prefix)?,
        };
        let event = EnvironmentEvent::LinkAdded {
            link: link.name.clone(),
            joint: joint.name.clone(),
        };
        if let Err(e) = graph.add_link_with_joint(link, Some(joint)) {
            tracing::warn!(error = %e, "add link rejected");
            return Err(e.into());
        }

        self.commit(
            event,
            ManagerUpdate {
                add: object.into_iter().collect(),
                ..ManagerUpdate::default()
            },
        );
        Ok(())
    }

    /// Remove `name`, its parent joint and everything below it. The root
    /// cannot be removed.
    pub fn remove_link(&mut self, name: &str) -> Result<RemovedSubtree, EnvironmentError> {
        let graph = self.graph.as_mut().ok_or(EnvironmentError::NotInitialized)?;
        let removed = graph.remove_link(name).inspect_err(|e| {
            tracing::warn!(error = %e, "remove link rejected");
        })?;

        let links = removed.link_names();
        for link in &links {
            self.disabled_links.remove(link);
        }
        self.commit(
            EnvironmentEvent::LinkRemoved {
                links: links.clone(),
                joints: removed.joint_names(),
            },
            ManagerUpdate {
                remove: links,
                ..ManagerUpdate::default()
            },
        );
        Ok(removed)
    }

    /// Re-parent `joint_name` and its subtree under `new_parent`.
    pub fn move_joint(&mut self, joint_name: &str, new_parent: &str) -> Result<(), EnvironmentError> {
        let graph = self.graph.as_mut().ok_or(EnvironmentError::NotInitialized)?;
        let old_parent = graph
            .joint(joint_name)
            .map(|j| j.parent_link_name.clone())
            .unwrap_or_default();
        graph.move_joint(joint_name, new_parent).inspect_err(|e| {
            tracing::warn!(error = %e, "move joint rejected");
        })?;

        self.commit(
            EnvironmentEvent::JointMoved {
                joint: joint_name.to_string(),
                old_parent,
                new_parent: new_parent.to_string(),
            },
            ManagerUpdate::default(),
        );
        Ok(())
    }

    /// Replace the parent-to-joint transform of `joint_name`.
    pub fn change_joint_origin(&mut self, joint_name: &str, origin: Pose) -> Result<(), EnvironmentError> {
        let graph = self.graph.as_mut().ok_or(EnvironmentError::NotInitialized)?;
        let old = graph
            .joint(joint_name)
            .map(|j| j.parent_to_joint_origin_transform)
            .unwrap_or_default();
        graph.change_joint_origin(joint_name, origin).inspect_err(|e| {
            tracing::warn!(error = %e, "change joint origin rejected");
        })?;

        self.commit(
            EnvironmentEvent::JointOriginChanged {
                joint: joint_name.to_string(),
                old,
                new: origin,
            },
            ManagerUpdate::default(),
        );
        Ok(())
    }

    /// Enable or disable the collision object of `name` in every manager.
    ///
    /// The setting is remembered, so managers attached later and clones see
    /// the same state.
    pub fn set_link_collision_enabled(&mut self, name: &str, enabled: bool) -> Result<(), EnvironmentError> {
        let graph = self.graph.as_ref().ok_or(EnvironmentError::NotInitialized)?;
        if !graph.contains_link(name) {
            return Err(EnvironmentError::LinkNotFound(name.to_string()));
        }
        if self.disabled_links.contains(name) != enabled {
            return Ok(());
        }
        if enabled {
            self.disabled_links.remove(name);
        } else {
            self.disabled_links.insert(name.to_string());
        }
        if let Some(m) = self.discrete.as_mut() {
            set_enabled(m.as_mut(), name, enabled);
        }
        if let Some(m) = self.continuous.as_mut() {
            set_enabled(m.as_mut(), name, enabled);
        }
        self.record(EnvironmentEvent::CollisionEnabledChanged {
            link: name.to_string(),
            enabled,
        });
        tracing::debug!(link = name, enabled, "link collision toggled");
        Ok(())
    }

    pub fn is_link_collision_enabled(&self, name: &str) -> bool {
        self.contains_link(name) && !self.disabled_links.contains(name)
    }

    // --- Contact managers ---

    /// Attach a discrete manager, replacing any previous one. The manager is
    /// cleared and seeded from the current tree.
    pub fn set_discrete_contact_manager(&mut self, mut manager: Box<dyn DiscreteContactManager>) {
        let _span = tracing::info_span!("attach_contact_manager", kind = "discrete").entered();
        self.seed(manager.as_mut(), "discrete");
        self.discrete = Some(manager);
    }

    /// Attach a continuous manager, replacing any previous one. The manager
    /// is cleared and seeded from the current tree.
    pub fn set_continuous_contact_manager(&mut self, mut manager: Box<dyn ContinuousContactManager>) {
        let _span = tracing::info_span!("attach_contact_manager", kind = "continuous").entered();
        self.seed(manager.as_mut(), "continuous");
        self.continuous = Some(manager);
    }

    pub fn discrete_contact_manager(&self) -> Option<&dyn DiscreteContactManager> {
        self.discrete.as_deref()
    }

    pub fn continuous_contact_manager(&self) -> Option<&dyn ContinuousContactManager> {
        self.continuous.as_deref()
    }

    /// Mutable access for pose updates and queries. Structural edits made
    /// through this handle are not tracked.
    pub fn discrete_contact_manager_mut(
        &mut self,
    ) -> Option<&mut (dyn DiscreteContactManager + 'static)> {
        self.discrete.as_deref_mut()
    }

    pub fn continuous_contact_manager_mut(
        &mut self,
    ) -> Option<&mut (dyn ContinuousContactManager + 'static)> {
        self.continuous.as_deref_mut()
    }

    /// Detach and return the discrete manager.
    pub fn take_discrete_contact_manager(&mut self) -> Option<Box<dyn DiscreteContactManager>> {
        self.discrete.take()
    }

    pub fn take_continuous_contact_manager(&mut self) -> Option<Box<dyn ContinuousContactManager>> {
        self.continuous.take()
    }

    // --- Allowed collision matrix ---

    pub fn allowed_collision_matrix(&self) -> &AllowedCollisionMatrix {
        &self.acm
    }

    pub fn add_allowed_collision(&mut self, link1: &str, link2: &str, reason: &str) {
        self.acm.add_allowed_collision(link1, link2, reason);
        self.record(EnvironmentEvent::AllowedCollisionAdded {
            link1: link1.to_string(),
            link2: link2.to_string(),
            reason: reason.to_string(),
        });
        self.push_allowed_fn();
    }

    pub fn remove_allowed_collision(&mut self, link1: &str, link2: &str) {
        self.acm.remove_allowed_collision(link1, link2);
        self.record(EnvironmentEvent::AllowedCollisionRemoved {
            link1: link1.to_string(),
            link2: link2.to_string(),
        });
        self.push_allowed_fn();
    }

    pub fn is_collision_allowed(&self, link1: &str, link2: &str) -> bool {
        self.acm.is_collision_allowed(link1, link2)
    }

    pub fn clear_allowed_collisions(&mut self) {
        self.acm.clear_allowed_collisions();
        self.record(EnvironmentEvent::AllowedCollisionsCleared);
        self.push_allowed_fn();
    }

    /// Allow contact between every parent/child pair in the tree. Returns
    /// the number of pairs written.
    pub fn add_adjacent_allowed_collisions(&mut self) -> Result<usize, EnvironmentError> {
        let graph = self.graph.as_ref().ok_or(EnvironmentError::NotInitialized)?;
        let pairs: Vec<(String, String)> = graph
            .joints()
            .map(|j| (j.parent_link_name.clone(), j.child_link_name.clone()))
            .collect();
        for (parent, child) in &pairs {
            self.acm.add_allowed_collision(parent, child, ADJACENT_REASON);
            self.record(EnvironmentEvent::AllowedCollisionAdded {
                link1: parent.clone(),
                link2: child.clone(),
                reason: ADJACENT_REASON.to_string(),
            });
        }
        self.push_allowed_fn();
        tracing::debug!(pairs = pairs.len(), "adjacent links allowed");
        Ok(pairs.len())
    }

    // --- Queries ---

    pub fn scene_graph(&self) -> Option<&SceneGraph> {
        self.graph.as_ref()
    }

    /// Link names in insertion order; empty before `init`.
    pub fn link_names(&self) -> Vec<String> {
        self.graph.as_ref().map(SceneGraph::link_names).unwrap_or_default()
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.graph.as_ref().map(SceneGraph::joint_names).unwrap_or_default()
    }

    /// Names of links that move with some joint. This is the exact sequence
    /// every attached manager holds.
    pub fn active_link_names(&self) -> &[String] {
        &self.active_links
    }

    pub fn root_link_name(&self) -> Option<&str> {
        self.graph.as_ref()?.root_link_name()
    }

    pub fn link(&self, name: &str) -> Option<&Link> {
        self.graph.as_ref()?.link(name)
    }

    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.graph.as_ref()?.joint(name)
    }

    pub fn contains_link(&self, name: &str) -> bool {
        self.graph.as_ref().is_some_and(|g| g.contains_link(name))
    }

    pub fn link_count(&self) -> usize {
        self.graph.as_ref().map_or(0, SceneGraph::link_count)
    }

    pub fn joint_count(&self) -> usize {
        self.graph.as_ref().map_or(0, SceneGraph::joint_count)
    }

    /// Number of successful mutations since creation. Survives
    /// [`drain_events`](Self::drain_events) and re-init.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn events(&self) -> &[EnvironmentEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<EnvironmentEvent> {
        std::mem::take(&mut self.event_log)
    }

    // --- Internals ---

    fn record(&mut self, event: EnvironmentEvent) {
        self.revision += 1;
        self.event_log.push(event);
    }

    /// Finish a successful tree edit: refresh the active links, log the
    /// event and forward `update` to the managers.
    fn commit(&mut self, event: EnvironmentEvent, update: ManagerUpdate) {
        if let Some(graph) = &self.graph {
            self.active_links = compute_active_links(graph);
        }
        tracing::debug!(?event, active = self.active_links.len(), "environment changed");
        self.record(event);
        self.push_update(&update);
    }

    fn push_update(&mut self, update: &ManagerUpdate) {
        let active = &self.active_links;
        if let Some(m) = self.discrete.as_mut() {
            update.apply("discrete", m.as_mut(), active);
        }
        if let Some(m) = self.continuous.as_mut() {
            update.apply("continuous", m.as_mut(), active);
        }
    }

    fn push_allowed_fn(&mut self) {
        if self.discrete.is_none() && self.continuous.is_none() {
            return;
        }
        let allowed = self.acm.contact_allowed_fn();
        if let Some(m) = self.discrete.as_mut() {
            m.set_is_contact_allowed_fn(Some(allowed.clone()));
        }
        if let Some(m) = self.continuous.as_mut() {
            m.set_is_contact_allowed_fn(Some(allowed));
        }
    }

    fn seed<M>(&self, manager: &mut M, kind: &str)
    where
        M: ContactManager + ?Sized,
    {
        manager.set_contact_distance_threshold(self.config.contact_distance_threshold);
        manager.set_is_contact_allowed_fn(Some(self.acm.contact_allowed_fn()));

        let mut add = Vec::new();
        if let Some(graph) = &self.graph {
            for link in graph.links() {
                match object_for(link, &self.disabled_links) {
                    Ok(Some(object)) => add.push(object),
                    Ok(None) => {}
                    Err(e) => tracing::error!(link = %link.name, error = %e, "skipping invalid collision geometry"),
                }
            }
        }
        let update = ManagerUpdate {
            reset: true,
            add,
            ..ManagerUpdate::default()
        };
        update.apply(kind, manager, &self.active_links);
        tracing::info!(
            objects = manager.collision_object_names().len(),
            active = self.active_links.len(),
            "contact manager attached"
        );
    }
}

fn set_enabled<M>(manager: &mut M, name: &str, enabled: bool)
where
    M: ContactManager + ?Sized,
{
    let known = if enabled {
        manager.enable_collision_object(name)
    } else {
        manager.disable_collision_object(name)
    };
    if known {
        tracing::trace!(link = name, enabled, "collision object toggled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use kinspace_collision::{SimpleCastManager, SimpleDiscreteManager};
    use kinspace_scene::samples::serial_arm;
    use kinspace_scene::{Collision, Geometry, JointType, SceneGraphError};

    fn arm_env() -> Environment {
        let mut env = Environment::default();
        env.init(serial_arm(7).unwrap()).unwrap();
        env.set_discrete_contact_manager(Box::new(SimpleDiscreteManager::new()));
        env.set_continuous_contact_manager(Box::new(SimpleCastManager::new()));
        env
    }

    fn assert_managers_in_sync(env: &Environment) {
        let discrete = env.discrete_contact_manager().unwrap();
        let continuous = env.continuous_contact_manager().unwrap();
        assert_eq!(discrete.active_collision_objects(), env.active_link_names());
        assert_eq!(continuous.active_collision_objects(), env.active_link_names());

        let mut expected: Vec<String> = env
            .scene_graph()
            .unwrap()
            .links()
            .filter(|l| l.has_collision())
            .map(|l| l.name.clone())
            .collect();
        expected.sort();
        assert_eq!(discrete.collision_object_names(), expected);
        assert_eq!(continuous.collision_object_names(), expected);
    }

    fn contains(names: &[String], name: &str) -> bool {
        names.iter().any(|n| n == name)
    }

    fn sphere_link(name: &str) -> Link {
        Link::new(name).with_collision(Collision::new(Geometry::Sphere { radius: 0.05 }))
    }

    #[test]
    fn uninitialized_environment_rejects_edits() {
        let mut env = Environment::default();
        assert!(!env.is_initialized());
        assert!(env.link_names().is_empty());
        assert_eq!(env.root_link_name(), None);
        assert_eq!(
            env.add_link(Link::new("a"), None),
            Err(EnvironmentError::NotInitialized)
        );
        assert_eq!(env.remove_link("a").unwrap_err(), EnvironmentError::NotInitialized);
        assert_eq!(env.move_joint("j", "a"), Err(EnvironmentError::NotInitialized));
    }

    #[test]
    fn init_well_formed_tree() {
        let env = arm_env();
        assert!(env.is_initialized());
        assert_eq!(env.root_link_name(), Some("base_link"));
        assert_eq!(env.link_count(), 9);
        assert_eq!(env.joint_count(), 8);
        assert_eq!(
            env.active_link_names(),
            ["link_1", "link_2", "link_3", "link_4", "link_5", "link_6", "link_7", "tool0"]
        );
        assert_managers_in_sync(&env);
    }

    #[test]
    fn init_rejects_duplicate_names() {
        let mut data = SceneGraphData::from(&serial_arm(2).unwrap());
        data.links.push(Link::new("link_1"));
        let mut env = Environment::default();
        assert_eq!(
            env.init_from_description(data),
            Err(EnvironmentError::Scene(SceneGraphError::DuplicateLink("link_1".into())))
        );
        assert!(!env.is_initialized());
    }

    #[test]
    fn init_rejects_multiple_roots() {
        let mut graph = serial_arm(2).unwrap();
        graph.add_link(Link::new("floating")).unwrap();
        let mut env = Environment::default();
        assert!(matches!(
            env.init(graph),
            Err(EnvironmentError::Scene(SceneGraphError::MultipleRoots(_)))
        ));
        assert!(!env.is_initialized());
    }

    #[test]
    fn init_rejects_cycle() {
        let mut graph = SceneGraph::new("loop");
        for name in ["base_link", "a", "b"] {
            graph.add_link(Link::new(name)).unwrap();
        }
        graph.set_root("base_link").unwrap();
        graph.add_joint(Joint::fixed("a_to_b", "a", "b")).unwrap();
        graph.add_joint(Joint::fixed("b_to_a", "b", "a")).unwrap();
        let mut env = Environment::default();
        assert!(matches!(
            env.init(graph),
            Err(EnvironmentError::Scene(SceneGraphError::Cycle(_)))
        ));
        assert!(!env.is_initialized());
    }

    #[test]
    fn init_rejects_invalid_collision_geometry() {
        let mut graph = serial_arm(1).unwrap();
        graph
            .add_link_with_joint(
                Link::new("flat").with_collision(Collision::new(Geometry::Sphere { radius: 0.0 })),
                None,
            )
            .unwrap();
        let mut env = Environment::default();
        assert!(matches!(env.init(graph), Err(EnvironmentError::Collision(_))));
        assert!(!env.is_initialized());
    }

    #[test]
    fn add_link_without_joint_attaches_to_root() {
        let mut env = arm_env();
        env.add_link(Link::new("link_n1"), None).unwrap();

        assert!(contains(&env.link_names(), "link_n1"));
        assert!(contains(&env.joint_names(), "joint_link_n1"));
        let joint = env.joint("joint_link_n1").unwrap();
        assert_eq!(joint.joint_type, JointType::Fixed);
        assert_eq!(joint.parent_link_name, "base_link");
        assert!(!contains(env.active_link_names(), "link_n1"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn add_link_with_joint() {
        let mut env = arm_env();
        env.add_link(Link::new("link_n1"), None).unwrap();
        env.add_link(
            Link::new("link_n2"),
            Some(Joint::fixed("joint_n1", "link_n1", "link_n2")),
        )
        .unwrap();

        assert!(contains(&env.link_names(), "link_n2"));
        assert!(contains(&env.joint_names(), "joint_n1"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn add_link_uses_configured_prefix() {
        let mut env = Environment::new(EnvironmentConfig {
            default_joint_prefix: "fixed_".into(),
            ..EnvironmentConfig::default()
        });
        env.init(serial_arm(1).unwrap()).unwrap();
        env.add_link(Link::new("camera"), None).unwrap();
        assert!(env.joint("fixed_camera").is_some());
    }

    #[test]
    fn add_link_with_collision_reaches_managers() {
        let mut env = arm_env();
        env.add_link(
            sphere_link("gripper"),
            Some(Joint::fixed("joint_gripper", "tool0", "gripper")),
        )
        .unwrap();
        let discrete = env.discrete_contact_manager().unwrap();
        assert!(discrete.has_collision_object("gripper"));
        assert_eq!(env.active_link_names().last().map(String::as_str), Some("gripper"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn failed_add_changes_nothing() {
        let mut env = arm_env();
        let revision = env.revision();

        assert!(matches!(
            env.add_link(Link::new("link_3"), None),
            Err(EnvironmentError::Scene(SceneGraphError::DuplicateLink(_)))
        ));
        assert!(matches!(
            env.add_link(
                Link::new("orphan"),
                Some(Joint::fixed("joint_orphan", "nowhere", "orphan"))
            ),
            Err(EnvironmentError::Scene(SceneGraphError::LinkNotFound(_)))
        ));
        let bad = Link::new("bad").with_collision(Collision::new(Geometry::Box {
            size: [0.1, -1.0, 0.1],
        }));
        assert!(matches!(env.add_link(bad, None), Err(EnvironmentError::Collision(_))));

        assert!(!env.contains_link("orphan"));
        assert!(!env.contains_link("bad"));
        assert_eq!(env.revision(), revision);
        assert_managers_in_sync(&env);
    }

    #[test]
    fn remove_link_cascades() {
        let mut env = arm_env();
        env.add_link(sphere_link("link_n1"), None).unwrap();
        env.add_link(
            sphere_link("link_n2"),
            Some(Joint::fixed("joint_n1", "link_n1", "link_n2")),
        )
        .unwrap();

        let removed = env.remove_link("link_n1").unwrap();
        assert_eq!(removed.link_names(), vec!["link_n1", "link_n2"]);

        let links = env.link_names();
        let joints = env.joint_names();
        assert!(!contains(&links, "link_n1"));
        assert!(!contains(&links, "link_n2"));
        assert!(!contains(&joints, "joint_link_n1"));
        assert!(!contains(&joints, "joint_n1"));
        assert!(!env.discrete_contact_manager().unwrap().has_collision_object("link_n2"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn remove_root_or_missing_fails() {
        let mut env = arm_env();
        assert!(matches!(
            env.remove_link("base_link"),
            Err(EnvironmentError::Scene(SceneGraphError::RemoveRoot(_)))
        ));
        assert!(matches!(
            env.remove_link("ghost"),
            Err(EnvironmentError::Scene(SceneGraphError::LinkNotFound(_)))
        ));
        assert_eq!(env.link_count(), 9);
    }

    #[test]
    fn remove_arm_segment_shrinks_active_list() {
        let mut env = arm_env();
        env.remove_link("link_5").unwrap();
        assert_eq!(env.active_link_names(), ["link_1", "link_2", "link_3", "link_4"]);
        assert_managers_in_sync(&env);
    }

    #[test]
    fn move_joint_reparents_subtree() {
        let mut env = arm_env();
        env.add_link(Link::new("link_n1"), None).unwrap();
        env.add_link(
            Link::new("link_n2"),
            Some(Joint::fixed("joint_n1", "link_n1", "link_n2")),
        )
        .unwrap();
        let links = env.link_names();
        let joints = env.joint_names();
        assert!(!contains(env.active_link_names(), "link_n2"));

        env.move_joint("joint_n1", "tool0").unwrap();

        assert_eq!(env.joint("joint_n1").unwrap().parent_link_name, "tool0");
        assert_eq!(env.link_names(), links);
        assert_eq!(env.joint_names(), joints);
        assert!(contains(env.active_link_names(), "link_n2"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn move_joint_into_own_subtree_fails() {
        let mut env = arm_env();
        assert!(matches!(
            env.move_joint("joint_a2", "link_5"),
            Err(EnvironmentError::Scene(SceneGraphError::WouldCreateCycle { .. }))
        ));
        assert_eq!(env.joint("joint_a2").unwrap().parent_link_name, "link_1");
    }

    #[test]
    fn move_joint_with_missing_endpoint_fails() {
        let mut env = arm_env();
        let revision = env.revision();
        assert_eq!(
            env.move_joint("ghost", "tool0"),
            Err(EnvironmentError::Scene(SceneGraphError::JointNotFound("ghost".into())))
        );
        assert_eq!(
            env.move_joint("joint_a2", "ghost"),
            Err(EnvironmentError::Scene(SceneGraphError::LinkNotFound("ghost".into())))
        );
        assert_eq!(env.revision(), revision);
        assert_eq!(env.joint("joint_a2").unwrap().parent_link_name, "link_1");
        assert_managers_in_sync(&env);
    }

    #[test]
    fn change_joint_origin_is_logged() {
        let mut env = arm_env();
        env.drain_events();
        let origin = Pose::from_translation(DVec3::new(0.0, 0.0, 0.3));
        env.change_joint_origin("joint_a3", origin).unwrap();
        assert_eq!(
            env.joint("joint_a3").unwrap().parent_to_joint_origin_transform,
            origin
        );
        assert!(matches!(
            env.events(),
            [EnvironmentEvent::JointOriginChanged { joint, .. }] if joint == "joint_a3"
        ));
    }

    #[test]
    fn acm_edits_reach_managers() {
        let mut env = arm_env();
        env.add_allowed_collision("link_1", "link_2", "test");
        assert!(env.is_collision_allowed("link_2", "link_1"));
        assert!(env.discrete_contact_manager().unwrap().is_contact_allowed("link_2", "link_1"));
        assert!(env.continuous_contact_manager().unwrap().is_contact_allowed("link_1", "link_2"));

        env.remove_allowed_collision("link_1", "link_2");
        assert!(!env.discrete_contact_manager().unwrap().is_contact_allowed("link_1", "link_2"));

        env.add_allowed_collision("link_3", "link_3", "self");
        assert_eq!(env.allowed_collision_matrix().len(), 1);
        env.clear_allowed_collisions();
        assert!(env.allowed_collision_matrix().is_empty());
        assert!(!env.discrete_contact_manager().unwrap().is_contact_allowed("link_3", "link_3"));
    }

    #[test]
    fn adjacent_pairs_allowed() {
        let mut env = arm_env();
        let revision = env.revision();
        assert_eq!(env.add_adjacent_allowed_collisions().unwrap(), 8);
        assert_eq!(env.revision(), revision + 8);
        assert_eq!(env.events().len(), 9);
        assert!(env.is_collision_allowed("link_1", "base_link"));
        assert!(env.is_collision_allowed("tool0", "link_7"));
        assert!(!env.is_collision_allowed("link_1", "link_3"));
        assert_eq!(
            env.allowed_collision_matrix().reason("link_7", "tool0"),
            Some(ADJACENT_REASON)
        );
    }

    #[test]
    fn adjacent_on_init_from_config() {
        let mut env = Environment::new(EnvironmentConfig {
            allow_adjacent_on_init: true,
            ..EnvironmentConfig::default()
        });
        env.init(serial_arm(2).unwrap()).unwrap();
        assert_eq!(env.allowed_collision_matrix().len(), 3);
        assert_eq!(env.events().len(), 1);
    }

    #[test]
    fn attach_pushes_threshold_and_filter() {
        let mut env = Environment::new(EnvironmentConfig {
            contact_distance_threshold: 0.02,
            ..EnvironmentConfig::default()
        });
        env.init(serial_arm(2).unwrap()).unwrap();
        env.add_allowed_collision("base_link", "link_1", "Adjacent");
        env.set_discrete_contact_manager(Box::new(SimpleDiscreteManager::new()));

        let m = env.discrete_contact_manager().unwrap();
        assert_eq!(m.contact_distance_threshold(), 0.02);
        assert!(m.is_contact_allowed("link_1", "base_link"));
        assert_eq!(m.active_collision_objects(), env.active_link_names());
    }

    #[test]
    fn attach_clears_stale_objects() {
        let mut stale = SimpleDiscreteManager::new();
        stale
            .add_collision_object(
                CollisionObject::new("stale", vec![Geometry::Sphere { radius: 1.0 }], vec![Pose::IDENTITY])
                    .unwrap(),
            )
            .unwrap();
        let mut env = Environment::default();
        env.init(serial_arm(1).unwrap()).unwrap();
        env.set_discrete_contact_manager(Box::new(stale));
        env.set_continuous_contact_manager(Box::new(SimpleCastManager::new()));
        assert!(!env.discrete_contact_manager().unwrap().has_collision_object("stale"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn unchanged_collision_enable_state_is_not_logged() {
        let mut env = arm_env();
        env.set_link_collision_enabled("link_2", false).unwrap();
        let revision = env.revision();
        let events = env.events().len();

        env.set_link_collision_enabled("link_2", false).unwrap();
        env.set_link_collision_enabled("link_3", true).unwrap();
        assert_eq!(env.revision(), revision);
        assert_eq!(env.events().len(), events);
        assert!(!env.is_link_collision_enabled("link_2"));
        assert!(env.is_link_collision_enabled("link_3"));
    }

    #[test]
    fn collision_enable_state_is_remembered() {
        let mut env = arm_env();
        env.set_link_collision_enabled("link_2", false).unwrap();
        assert!(!env.is_link_collision_enabled("link_2"));
        assert_eq!(
            env.discrete_contact_manager().unwrap().is_collision_object_enabled("link_2"),
            Some(false)
        );

        env.set_discrete_contact_manager(Box::new(SimpleDiscreteManager::new()));
        assert_eq!(
            env.discrete_contact_manager().unwrap().is_collision_object_enabled("link_2"),
            Some(false)
        );

        env.set_link_collision_enabled("link_2", true).unwrap();
        assert_eq!(
            env.continuous_contact_manager().unwrap().is_collision_object_enabled("link_2"),
            Some(true)
        );
        assert_eq!(
            env.set_link_collision_enabled("ghost", false),
            Err(EnvironmentError::LinkNotFound("ghost".into()))
        );
    }

    #[test]
    fn reinit_resets_state_and_resyncs_managers() {
        let mut env = arm_env();
        env.add_link(sphere_link("extra"), None).unwrap();
        env.add_allowed_collision("link_1", "link_2", "test");
        env.set_link_collision_enabled("link_1", false).unwrap();

        env.init(serial_arm(3).unwrap()).unwrap();

        assert_eq!(env.link_count(), 5);
        assert!(env.allowed_collision_matrix().is_empty());
        assert!(env.is_link_collision_enabled("link_1"));
        assert!(matches!(env.events(), [EnvironmentEvent::Initialized { links: 5, .. }]));
        assert!(!env.discrete_contact_manager().unwrap().has_collision_object("extra"));
        assert!(!env.discrete_contact_manager().unwrap().has_collision_object("link_7"));
        assert_managers_in_sync(&env);
    }

    #[test]
    fn failed_reinit_keeps_previous_tree() {
        let mut env = arm_env();
        let mut broken = serial_arm(2).unwrap();
        broken.add_link(Link::new("floating")).unwrap();
        assert!(env.init(broken).is_err());
        assert!(env.is_initialized());
        assert_eq!(env.link_count(), 9);
        assert_managers_in_sync(&env);
    }

    #[test]
    fn events_and_revision() {
        let mut env = arm_env();
        assert_eq!(env.events().len(), 1);
        env.add_link(Link::new("link_n1"), None).unwrap();
        env.remove_link("link_n1").unwrap();
        assert_eq!(env.revision(), 3);

        let events = env.drain_events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            EnvironmentEvent::LinkAdded {
                link: "link_n1".into(),
                joint: "joint_link_n1".into(),
            }
        );
        assert!(env.events().is_empty());
        assert_eq!(env.revision(), 3);
    }

    #[test]
    fn clone_is_deep_and_independent() {
        let mut env = arm_env();
        env.add_allowed_collision("link_1", "link_2", "test");
        let mut copy = env.clone();
        assert_eq!(copy.active_link_names(), env.active_link_names());
        assert_managers_in_sync(&copy);

        copy.remove_link("link_4").unwrap();
        copy.clear_allowed_collisions();

        assert_eq!(env.link_count(), 9);
        assert!(env.is_collision_allowed("link_1", "link_2"));
        assert!(env.discrete_contact_manager().unwrap().has_collision_object("link_4"));
        assert!(env.discrete_contact_manager().unwrap().is_contact_allowed("link_1", "link_2"));
        assert_eq!(env.active_link_names().len(), 8);
        assert_managers_in_sync(&env);
        assert_managers_in_sync(&copy);
    }

    #[test]
    fn clones_work_on_threads() {
        let env = arm_env();
        let results: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (1..=4)
                .map(|i| {
                    let mut local = env.clone();
                    s.spawn(move || {
                        local.remove_link(&format!("link_{}", 8 - i)).unwrap();
                        assert_managers_in_sync(&local);
                        local.link_count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, vec![7, 6, 5, 4]);
        assert_eq!(env.link_count(), 9);
    }

    #[test]
    fn manager_pose_updates_through_mut_handle() {
        let mut env = arm_env();
        let pose = Pose::from_translation(DVec3::new(0.0, 0.0, 1.0));
        let m = env.discrete_contact_manager_mut().unwrap();
        assert!(m.set_collision_object_transform("link_1", pose));
        assert_eq!(
            env.discrete_contact_manager().unwrap().collision_object_transform("link_1"),
            Some(pose)
        );
    }

    /// Discrete manager that refuses every new object.
    #[derive(Debug, Clone, Default)]
    struct RejectingManager {
        inner: SimpleDiscreteManager,
    }

    impl ContactManager for RejectingManager {
        fn add_collision_object(&mut self, object: CollisionObject) -> Result<(), CollisionError> {
            Err(CollisionError::InvalidShape {
                name: object.name,
                reason: "rejected".into(),
            })
        }

        fn remove_collision_object(&mut self, name: &str) -> bool {
            self.inner.remove_collision_object(name)
        }

        fn has_collision_object(&self, name: &str) -> bool {
            self.inner.has_collision_object(name)
        }

        fn enable_collision_object(&mut self, name: &str) -> bool {
            self.inner.enable_collision_object(name)
        }

        fn disable_collision_object(&mut self, name: &str) -> bool {
            self.inner.disable_collision_object(name)
        }

        fn is_collision_object_enabled(&self, name: &str) -> Option<bool> {
            self.inner.is_collision_object_enabled(name)
        }

        fn collision_object_names(&self) -> Vec<String> {
            self.inner.collision_object_names()
        }

        fn set_active_collision_objects(&mut self, names: &[String]) {
            self.inner.set_active_collision_objects(names);
        }

        fn active_collision_objects(&self) -> &[String] {
            self.inner.active_collision_objects()
        }

        fn set_contact_distance_threshold(&mut self, distance: f64) {
            self.inner.set_contact_distance_threshold(distance);
        }

        fn contact_distance_threshold(&self) -> f64 {
            self.inner.contact_distance_threshold()
        }

        fn set_is_contact_allowed_fn(&mut self, allowed: Option<kinspace_collision::IsContactAllowedFn>) {
            self.inner.set_is_contact_allowed_fn(allowed);
        }

        fn is_contact_allowed(&self, a: &str, b: &str) -> bool {
            self.inner.is_contact_allowed(a, b)
        }
    }

    impl DiscreteContactManager for RejectingManager {
        fn set_collision_object_transform(&mut self, name: &str, pose: Pose) -> bool {
            self.inner.set_collision_object_transform(name, pose)
        }

        fn collision_object_transform(&self, name: &str) -> Option<Pose> {
            self.inner.collision_object_transform(name)
        }

        fn clone_box(&self) -> Box<dyn DiscreteContactManager> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn rejected_add_keeps_tree_and_active_list() {
        let mut env = Environment::default();
        env.init(serial_arm(3).unwrap()).unwrap();
        env.set_discrete_contact_manager(Box::new(RejectingManager::default()));
        assert!(env.discrete_contact_manager().unwrap().collision_object_names().is_empty());

        env.add_link(
            sphere_link("gripper"),
            Some(Joint::fixed("joint_gripper", "tool0", "gripper")),
        )
        .unwrap();
        assert!(env.contains_link("gripper"));
        let m = env.discrete_contact_manager().unwrap();
        assert!(!m.has_collision_object("gripper"));
        assert_eq!(m.active_collision_objects(), env.active_link_names());
        assert!(contains(env.active_link_names(), "gripper"));
    }
}
