use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunables for an [`Environment`](crate::Environment).
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Contact distance handed to every manager when it is attached.
    pub contact_distance_threshold: f64,
    /// Allow every parent/child link pair in the matrix right after `init`.
    pub allow_adjacent_on_init: bool,
    /// Prefix of the fixed joint synthesized when a link is added alone.
    pub default_joint_prefix: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            contact_distance_threshold: 0.0,
            allow_adjacent_on_init: false,
            default_joint_prefix: "joint_".to_string(),
        }
    }
}

/// Errors from loading an [`EnvironmentConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("contact distance threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
}

impl EnvironmentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.contact_distance_threshold;
        if !t.is_finite() || t < 0.0 {
            return Err(ConfigError::InvalidThreshold(t));
        }
        Ok(())
    }
}
