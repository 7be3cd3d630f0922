use kinspace_common::Pose;

use crate::error::CollisionError;
use crate::manager::{ContactManager, ContinuousContactManager, IsContactAllowedFn};
use crate::object::CollisionObject;
use crate::registry::ObjectRegistry;

/// Reference continuous manager. Each object carries a start and end pose;
/// a static object has both equal.
#[derive(Debug, Clone, Default)]
pub struct SimpleCastManager {
    registry: ObjectRegistry,
}

impl SimpleCastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs a swept narrow phase would have to test, sorted by name.
    pub fn candidate_pairs(&self) -> Vec<(String, String)> {
        self.registry.candidate_pairs()
    }

    /// Whether the object moves between its start and end pose.
    pub fn is_swept(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .is_some_and(|e| !e.start.abs_diff_eq(&e.end, 1e-12))
    }
}

impl ContactManager for SimpleCastManager {
    fn add_collision_object(&mut self, object: CollisionObject) -> Result<(), CollisionError> {
        self.registry.add(object)
    }

    fn remove_collision_object(&mut self, name: &str) -> bool {
        self.registry.remove(name)
    }

    fn has_collision_object(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    fn enable_collision_object(&mut self, name: &str) -> bool {
        self.registry.set_enabled(name, true)
    }

    fn disable_collision_object(&mut self, name: &str) -> bool {
        self.registry.set_enabled(name, false)
    }

    fn is_collision_object_enabled(&self, name: &str) -> Option<bool> {
        self.registry.is_enabled(name)
    }

    fn collision_object_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn set_active_collision_objects(&mut self, names: &[String]) {
        self.registry.set_active(names);
    }

    fn active_collision_objects(&self) -> &[String] {
        self.registry.active()
    }

    fn set_contact_distance_threshold(&mut self, distance: f64) {
        self.registry.set_contact_distance(distance);
    }

    fn contact_distance_threshold(&self) -> f64 {
        self.registry.contact_distance()
    }

    fn set_is_contact_allowed_fn(&mut self, allowed: Option<IsContactAllowedFn>) {
        self.registry.set_allowed(allowed);
    }

    fn is_contact_allowed(&self, a: &str, b: &str) -> bool {
        self.registry.is_allowed(a, b)
    }
}

impl ContinuousContactManager for SimpleCastManager {
    fn set_collision_object_transform(&mut self, name: &str, pose: Pose) -> bool {
        self.registry.set_pose(name, pose, pose)
    }

    fn set_collision_object_cast_transform(&mut self, name: &str, start: Pose, end: Pose) -> bool {
        self.registry.set_pose(name, start, end)
    }

    fn collision_object_cast_transform(&self, name: &str) -> Option<(Pose, Pose)> {
        self.registry.get(name).map(|e| (e.start, e.end))
    }

    fn clone_box(&self) -> Box<dyn ContinuousContactManager> {
        Box::new(self.clone())
    }
}
