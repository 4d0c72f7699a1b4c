use thiserror::Error;

/// Errors raised by the mesh, outline and paint tools.
#[derive(Debug, Error)]
pub enum InkError {
    #[error("object '{0}' is not a mesh")]
    NotAMesh(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("color layer not found: {0}")]
    LayerNotFound(String),

    #[error("vertex group not found: {0}")]
    GroupNotFound(String),

    #[error("vertex {vertex} is not in group '{group}'")]
    WeightNotFound { group: String, vertex: u32 },

    #[error("draw handle is no longer registered")]
    InvalidHandle,

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("obj parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InkError>;
