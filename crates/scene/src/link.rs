use glam::DVec3;
use kinspace_common::Pose;
use serde::{Deserialize, Serialize};

/// Shape primitive attached to a link for display or collision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Box { size: [f64; 3] },
    Sphere { radius: f64 },
    Cylinder { radius: f64, length: f64 },
    Mesh { uri: String, scale: [f64; 3] },
}

impl Geometry {
    pub fn mesh(uri: impl Into<String>) -> Self {
        Self::Mesh {
            uri: uri.into(),
            scale: [1.0; 3],
        }
    }
}

/// Visual element: geometry at an offset, with an optional material name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    #[serde(default)]
    pub origin: Pose,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

/// Collision element: geometry at an offset in the link frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    #[serde(default)]
    pub origin: Pose,
    pub geometry: Geometry,
}

impl Collision {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            origin: Pose::IDENTITY,
            geometry,
        }
    }
}

/// Mass properties of a link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inertial {
    #[serde(default)]
    pub origin: Pose,
    pub mass: f64,
    /// Diagonal of the inertia tensor in the inertial frame.
    pub inertia: DVec3,
}

/// A named rigid body in the kinematic tree.
///
/// The geometry and inertial payload is carried through the tree untouched;
/// only the collision list is read, when the link is handed to contact
/// managers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visual: Vec<Visual>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collision: Vec<Collision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inertial: Option<Inertial>,
}

impl Link {
    /// A link with no geometry or mass.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visual: Vec::new(),
            collision: Vec::new(),
            inertial: None,
        }
    }

    pub fn with_collision(mut self, collision: Collision) -> Self {
        self.collision.push(collision);
        self
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual.push(visual);
        self
    }

    pub fn with_inertial(mut self, inertial: Inertial) -> Self {
        self.inertial = Some(inertial);
        self
    }

    pub fn has_collision(&self) -> bool {
        !self.collision.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_collisions() {
        let link = Link::new("link_1")
            .with_collision(Collision::new(Geometry::Sphere { radius: 0.1 }))
            .with_collision(Collision::new(Geometry::mesh("package://arm/l1.stl")));
        assert!(link.has_collision());
        assert_eq!(link.collision.len(), 2);
        assert!(!Link::new("empty").has_collision());
    }

    #[test]
    fn geometry_serializes_with_tag() {
        let json = serde_json::to_string(&Geometry::Sphere { radius: 0.5 }).unwrap();
        assert!(json.contains("\"type\":\"sphere\""));
        let back: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Geometry::Sphere { radius: 0.5 });
    }

    #[test]
    fn link_defaults_missing_payload() {
        let link: Link = serde_json::from_str(r#"{"name":"tool0"}"#).unwrap();
        assert_eq!(link, Link::new("tool0"));
    }
}
