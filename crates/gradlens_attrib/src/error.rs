//! Error types for the attribution engine.

use thiserror::Error;

use gradlens_core::CoreError;

/// Result type alias using [`AttribError`].
pub type Result<T> = std::result::Result<T, AttribError>;

/// Errors raised while computing attributions.
///
/// Configuration problems surface on the first attribution call that
/// touches them, since cuts are only resolved against a concrete
/// invocation. A failure aborts the whole call; no variant is retried or
/// silently skipped.
#[derive(Error, Debug)]
pub enum AttribError {
    /// Strategy parameters are incompatible with the slice or cut shape.
    #[error("Configuration error at {cut}: {reason}")]
    Configuration {
        /// The cut the configuration references.
        cut: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The backend could not compute the required gradient.
    #[error("Differentiation failed at {cut} while computing {operation}")]
    Differentiation {
        /// The cut the gradient was taken at.
        cut: String,
        /// The operation being differentiated.
        operation: String,
    },

    /// A distribution variant's shape differs from the original cut value.
    #[error("Shape error at {cut}: expected {expected:?}, got {got:?}")]
    Shape {
        /// The cut the variant was generated at.
        cut: String,
        /// Shape of the original cut value.
        expected: Vec<usize>,
        /// Shape of the offending variant.
        got: Vec<usize>,
    },

    /// Error from the model or backend capability.
    #[error(transparent)]
    Core(#[from] CoreError),
}
