use glam::DVec3;
use kinspace_common::Pose;
use serde::{Deserialize, Serialize};

/// Kind of motion a joint permits between its parent and child link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    #[default]
    Fixed,
    Revolute,
    Continuous,
    Prismatic,
    Planar,
    Floating,
}

impl JointType {
    /// Whether the child can move relative to the parent.
    pub fn is_movable(self) -> bool {
        !matches!(self, Self::Fixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Planar => "planar",
            Self::Floating => "floating",
        }
    }
}

/// Position, effort and velocity bounds of a movable joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub effort: f64,
    #[serde(default)]
    pub velocity: f64,
}

impl JointLimits {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            effort: 0.0,
            velocity: 0.0,
        }
    }
}

/// A named, typed connector between a parent and a child link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    #[serde(rename = "type", default)]
    pub joint_type: JointType,
    pub parent_link_name: String,
    pub child_link_name: String,
    /// Static transform from the parent link frame to the joint frame.
    #[serde(default)]
    pub parent_to_joint_origin_transform: Pose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<JointLimits>,
}

impl Joint {
    /// A fixed joint with identity origin and no endpoints yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joint_type: JointType::Fixed,
            parent_link_name: String::new(),
            child_link_name: String::new(),
            parent_to_joint_origin_transform: Pose::IDENTITY,
            axis: None,
            limits: None,
        }
    }

    /// Fixed joint between two named links.
    pub fn fixed(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self::new(name).connect(parent, child)
    }

    /// Revolute joint about `axis` between two named links.
    pub fn revolute(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        axis: DVec3,
    ) -> Self {
        Self {
            joint_type: JointType::Revolute,
            axis: Some(axis),
            ..Self::fixed(name, parent, child)
        }
    }

    pub fn connect(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.parent_link_name = parent.into();
        self.child_link_name = child.into();
        self
    }

    pub fn with_type(mut self, joint_type: JointType) -> Self {
        self.joint_type = joint_type;
        self
    }

    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.parent_to_joint_origin_transform = origin;
        self
    }

    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = Some(limits);
        self
    }
}
