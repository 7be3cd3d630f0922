use kinspace_common::Pose;
use kinspace_scene::{Geometry, Link};

use crate::error::CollisionError;

/// The collision representation of one link: a set of shapes at fixed
/// offsets in the link frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionObject {
    pub name: String,
    pub shapes: Vec<Geometry>,
    pub shape_poses: Vec<Pose>,
    pub enabled: bool,
}

impl CollisionObject {
    /// Build and validate an enabled object.
    pub fn new(
        name: impl Into<String>,
        shapes: Vec<Geometry>,
        shape_poses: Vec<Pose>,
    ) -> Result<Self, CollisionError> {
        let object = Self {
            name: name.into(),
            shapes,
            shape_poses,
            enabled: true,
        };
        object.validate()?;
        Ok(object)
    }

    /// The object for a link's collision elements, or `None` when the link
    /// has no collision geometry.
    pub fn from_link(link: &Link) -> Result<Option<Self>, CollisionError> {
        if !link.has_collision() {
            return Ok(None);
        }
        let (shapes, poses) = link
            .collision
            .iter()
            .map(|c| (c.geometry.clone(), c.origin))
            .unzip();
        Self::new(link.name.clone(), shapes, poses).map(Some)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check shape/pose pairing and that every primitive has a positive,
    /// finite extent.
    pub fn validate(&self) -> Result<(), CollisionError> {
        if self.shapes.is_empty() {
            return Err(CollisionError::EmptyObject(self.name.clone()));
        }
        if self.shapes.len() != self.shape_poses.len() {
            return Err(CollisionError::ShapePoseMismatch {
                name: self.name.clone(),
                shapes: self.shapes.len(),
                poses: self.shape_poses.len(),
            });
        }
        for shape in &self.shapes {
            if let Err(reason) = check_shape(shape) {
                return Err(CollisionError::InvalidShape {
                    name: self.name.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

fn check_shape(shape: &Geometry) -> Result<(), String> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    match shape {
        Geometry::Box { size } if !size.iter().all(|v| positive(*v)) => {
            Err(format!("box size {size:?} must be positive"))
        }
        Geometry::Sphere { radius } if !positive(*radius) => {
            Err(format!("sphere radius {radius} must be positive"))
        }
        Geometry::Cylinder { radius, length } if !positive(*radius) || !positive(*length) => Err(
            format!("cylinder radius {radius} and length {length} must be positive"),
        ),
        Geometry::Mesh { uri, .. } if uri.is_empty() => Err("mesh uri is empty".to_string()),
        Geometry::Mesh { scale, .. } if !scale.iter().all(|v| positive(*v)) => {
            Err(format!("mesh scale {scale:?} must be positive"))
        }
        _ => Ok(()),
    }
}
