/// Errors from scene graph construction, validation and tree edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneGraphError {
    #[error("link '{0}' already exists")]
    DuplicateLink(String),
    #[error("joint '{0}' already exists")]
    DuplicateJoint(String),
    #[error("link '{0}' not found")]
    LinkNotFound(String),
    #[error("joint '{0}' not found")]
    JointNotFound(String),
    #[error("no root link set")]
    MissingRoot,
    #[error("links without a parent joint besides the root: {0:?}")]
    MultipleRoots(Vec<String>),
    #[error("root link '{0}' has a parent joint")]
    RootHasParent(String),
    #[error("link '{0}' has more than one parent joint")]
    MultipleParents(String),
    #[error("graph contains a cycle through link '{0}'")]
    Cycle(String),
    #[error("link '{0}' is not reachable from the root")]
    Unreachable(String),
    #[error("cannot remove root link '{0}'")]
    RemoveRoot(String),
    #[error("moving joint '{joint}' under '{parent}' would create a cycle")]
    WouldCreateCycle { joint: String, parent: String },
    #[error("joint '{joint}' has child '{child}' but the link is named '{link}'")]
    ChildMismatch {
        joint: String,
        child: String,
        link: String,
    },
    #[error("cannot resolve resource '{url}': {reason}")]
    UnresolvedResource { url: String, reason: String },
}
