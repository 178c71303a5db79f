//! Error taxonomy shared by the scene, visual and GPU resource layers.
//!
//! Every fallible operation of the core returns [`Result<T>`]. Errors are raised
//! where the offending value is assigned or constructed; nothing is retried.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// Vertex, color or index counts disagree.
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Declared pixel/data format is inconsistent with the supplied data shape.
    #[error("format error: {0}")]
    Format(String),

    /// Attaching a node under itself or one of its descendants.
    #[error("cannot attach {child} under {parent}: it would create a cycle")]
    Cycle { child: String, parent: String },

    /// A value of the wrong resource kind was assigned to a typed slot.
    #[error("type mismatch for {slot}: expected {expected}, got {actual}")]
    TypeMismatch {
        slot: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Failure reported by a GPU backend (unknown handle, backend limits, ...).
    #[error("gpu error: {0}")]
    Gpu(String),
}

impl SceneError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SceneError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
