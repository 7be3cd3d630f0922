use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Rigid 3D transform: translation followed by rotation.
///
/// Used for joint origins and collision shape offsets. Unlike a render
/// transform there is no scale; kinematic frames are rigid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Pure translation.
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            rotation: DQuat::IDENTITY,
        }
    }

    /// Build from `xyz` and roll/pitch/yaw (radians), the convention robot
    /// descriptions use for origins.
    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            translation: DVec3::from_array(xyz),
            rotation: DQuat::from_euler(glam::EulerRot::ZYX, rpy[2], rpy[1], rpy[0]),
        }
    }

    /// Apply this pose to a point.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// Approximate equality within `eps` on both translation and rotation.
    pub fn abs_diff_eq(&self, other: &Self, eps: f64) -> bool {
        self.translation.abs_diff_eq(other.translation, eps)
            && (self.rotation.abs_diff_eq(other.rotation, eps)
                || self.rotation.abs_diff_eq(-other.rotation, eps))
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            translation: self.transform_point(rhs.translation),
            rotation: (self.rotation * rhs.rotation).normalize(),
        }
    }
}
