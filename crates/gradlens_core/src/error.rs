//! Error types for gradlens_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors raised by model and backend capabilities.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The cut does not name a point in the model's topology.
    #[error("Cut {cut} does not resolve against the model topology")]
    UnresolvedCut {
        /// Description of the offending cut.
        cut: String,
    },

    /// The destination cut cannot be reached from the source cut.
    #[error("Cut {to} is not reachable from {from} in the model's execution order")]
    UnreachableCut {
        /// The source cut of the slice.
        from: String,
        /// The destination cut of the slice.
        to: String,
    },

    /// Shape mismatch between tensors.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected dimensions.
        expected: Vec<usize>,
        /// Actual dimensions.
        got: Vec<usize>,
    },

    /// Tensor/array conversion failed.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
