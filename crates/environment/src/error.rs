use kinspace_collision::CollisionError;
use kinspace_scene::SceneGraphError;

/// Errors from environment operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("environment is not initialized")]
    NotInitialized,
    #[error("scene graph: {0}")]
    Scene(#[from] SceneGraphError),
    #[error("collision geometry: {0}")]
    Collision(#[from] CollisionError),
    #[error("link '{0}' not found")]
    LinkNotFound(String),
}
