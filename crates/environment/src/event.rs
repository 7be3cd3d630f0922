use kinspace_common::Pose;
use serde::{Deserialize, Serialize};

/// A record produced by every successful mutation of the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnvironmentEvent {
    /// A tree was installed. Earlier events are discarded.
    Initialized {
        name: String,
        links: usize,
        joints: usize,
    },
    LinkAdded { link: String, joint: String },
    /// Cascading removal; the requested link is first in `links`.
    LinkRemoved {
        links: Vec<String>,
        joints: Vec<String>,
    },
    JointMoved {
        joint: String,
        old_parent: String,
        new_parent: String,
    },
    JointOriginChanged { joint: String, old: Pose, new: Pose },
    CollisionEnabledChanged { link: String, enabled: bool },
    AllowedCollisionAdded {
        link1: String,
        link2: String,
        reason: String,
    },
    AllowedCollisionRemoved { link1: String, link2: String },
    AllowedCollisionsCleared,
}
