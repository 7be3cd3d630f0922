use std::fmt;
use std::sync::Arc;

use kinspace_common::Pose;

use crate::error::CollisionError;
use crate::object::CollisionObject;

/// Predicate deciding whether contact between two named objects is expected
/// and should be ignored.
///
/// Shared between a manager and its clones, so it must be immutable.
pub type IsContactAllowedFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Operations common to every contact manager.
pub trait ContactManager: Send + fmt::Debug {
    /// Register an object, replacing any object with the same name.
    fn add_collision_object(&mut self, object: CollisionObject) -> Result<(), CollisionError>;

    /// Returns false if no object had that name.
    fn remove_collision_object(&mut self, name: &str) -> bool;

    fn has_collision_object(&self, name: &str) -> bool;

    fn enable_collision_object(&mut self, name: &str) -> bool;

    fn disable_collision_object(&mut self, name: &str) -> bool;

    /// `None` if no object has that name.
    fn is_collision_object_enabled(&self, name: &str) -> Option<bool>;

    /// Names of all registered objects, sorted.
    fn collision_object_names(&self) -> Vec<String>;

    /// Replace the ordered list of active (movable) object names.
    fn set_active_collision_objects(&mut self, names: &[String]);

    fn active_collision_objects(&self) -> &[String];

    fn set_contact_distance_threshold(&mut self, distance: f64);

    fn contact_distance_threshold(&self) -> f64;

    fn set_is_contact_allowed_fn(&mut self, allowed: Option<IsContactAllowedFn>);

    /// Whether the installed filter suppresses contact between `a` and `b`.
    /// False when no filter is installed.
    fn is_contact_allowed(&self, a: &str, b: &str) -> bool;
}

/// Contact manager that checks objects at a single pose.
pub trait DiscreteContactManager: ContactManager {
    fn set_collision_object_transform(&mut self, name: &str, pose: Pose) -> bool;

    fn collision_object_transform(&self, name: &str) -> Option<Pose>;

    /// Deep copy, independent of `self`.
    fn clone_box(&self) -> Box<dyn DiscreteContactManager>;
}

/// Contact manager that checks objects swept between two poses.
pub trait ContinuousContactManager: ContactManager {
    /// Place a static (non-swept) object.
    fn set_collision_object_transform(&mut self, name: &str, pose: Pose) -> bool;

    /// Sweep an object from `start` to `end`.
    fn set_collision_object_cast_transform(&mut self, name: &str, start: Pose, end: Pose) -> bool;

    /// `(start, end)`; both equal for a static object.
    fn collision_object_cast_transform(&self, name: &str) -> Option<(Pose, Pose)>;

    /// Deep copy, independent of `self`.
    fn clone_box(&self) -> Box<dyn ContinuousContactManager>;
}

impl Clone for Box<dyn DiscreteContactManager> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl Clone for Box<dyn ContinuousContactManager> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
