use kinspace_common::Pose;

use crate::error::CollisionError;
use crate::manager::{ContactManager, DiscreteContactManager, IsContactAllowedFn};
use crate::object::CollisionObject;
use crate::registry::ObjectRegistry;

/// Reference discrete manager: exhaustive pair enumeration over registered
/// objects at their current pose.
///
/// It tracks everything a real back end is told, which makes it the manager
/// of choice for tests and for tools that only need bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SimpleDiscreteManager {
    registry: ObjectRegistry,
}

impl SimpleDiscreteManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs a narrow phase would have to test, sorted by name.
    pub fn candidate_pairs(&self) -> Vec<(String, String)> {
        self.registry.candidate_pairs()
    }
}

impl ContactManager for SimpleDiscreteManager {
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

impl DiscreteContactManager for SimpleDiscreteManager {
    fn set_collision_object_transform(&mut self, name: &str, pose: Pose) -> bool {
        self.registry.set_pose(name, pose, pose)
    }

    fn collision_object_transform(&self, name: &str) -> Option<Pose> {
        self.registry.get(name).map(|e| e.start)
    }

    fn clone_box(&self) -> Box<dyn DiscreteContactManager> {
        Box::new(self.clone())
    }
}
