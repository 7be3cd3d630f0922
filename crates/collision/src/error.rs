/// Errors raised when building or registering collision objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollisionError {
    #[error("collision object '{0}' has no shapes")]
    EmptyObject(String),
    #[error("collision object '{name}' has {shapes} shapes but {poses} poses")]
    ShapePoseMismatch {
        name: String,
        shapes: usize,
        poses: usize,
    },
    #[error("collision object '{name}' has an invalid shape: {reason}")]
    InvalidShape { name: String, reason: String },
}
