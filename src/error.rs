//! Error type shared by tensors, layers and the model evaluator.

use thiserror::Error;

/// Errors raised while building or evaluating a model.
///
/// Every error aborts the current operation and is reported whole; nothing is
/// retried or coerced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NnError {
    /// The incoming data does not have the rank or dimensions the operation expects.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}.")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// A parameter tensor disagrees with the dimensions declared for its layer.
    #[error("Invalid parameter '{parameter}' for {layer}: expected shape {expected:?}, got {actual:?}.")]
    InvalidParameter {
        layer: &'static str,
        parameter: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Unknown activation, malformed padding mode, bad window arity and the like.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding lookup outside `[0, len)`.
    #[error("Index {index} out of range for embedding table of {len} rows.")]
    IndexOutOfRange { index: f64, len: usize },
}

impl NnError {
    pub(crate) fn shape(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        NnError::ShapeMismatch {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        NnError::Configuration(message.into())
    }

    /// Prefixes a shape mismatch with the position and kind of the layer it came from.
    pub(crate) fn at_layer(self, position: usize, kind: &str) -> Self {
        match self {
            NnError::ShapeMismatch {
                context,
                expected,
                actual,
            } => {
                let context = if context == kind {
                    format!("layer {} ({})", position, kind)
                } else {
                    format!("layer {} ({}): {}", position, kind, context)
                };
                NnError::ShapeMismatch {
                    context,
                    expected,
                    actual,
                }
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, NnError>;
