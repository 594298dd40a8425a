//! # gradlens_attrib
//!
//! The gradlens attribution engine: distribution-of-interest and
//! quantity-of-interest strategies, composed by [`InternalInfluence`] into
//! gradient-based attributions over a model slice.
//!
//! An attribution run forwards the model to the slice's source cut,
//! generates perturbed variants of the value observed there, pushes each
//! variant to the destination cut, reduces it to a per-example scalar, and
//! averages the gradients of that scalar back at the variants. Optionally
//! the average is weighted elementwise by the original activation.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod doi;
mod error;
mod influence;
mod qoi;

pub use doi::{Baseline, Doi, GaussianDoi, LinearDoi, PointDoi};
pub use error::{AttribError, Result};
pub use influence::{InfluenceConfig, InternalInfluence};
pub use qoi::{ClassQoi, ComparativeQoi, InternalChannelQoi, LambdaQoi, MaxClassQoi, Qoi, SumQoi};
