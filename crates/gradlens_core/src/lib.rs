//! # gradlens_core
//!
//! Capability contracts and addressing for the gradlens attribution engine.
//!
//! This crate provides:
//! - [`Cut`] and [`Slice`] for naming computation points in a model
//! - [`ModelInputs`] for snapshotting the original call arguments
//! - The [`Model`] capability trait (forward to a cut, forward between cuts)
//! - Backend glue: tensor/array conversion and the gradient op
//! - [`Seed`] for reproducible random number generation
//!
//! ## Shape Convention
//!
//! Cut values are rank-2 float tensors `(B, U)`:
//! - `B`: Batch size (leading dimension, preserved end to end)
//! - `U`: Units/features observed at the cut
//!
//! Plain arrays use `ndarray::Array2<f32>` with the same convention and are
//! converted only at the [`backend`] boundary.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
mod error;
mod inputs;
mod model;
mod seed;
mod slices;

pub use error::{CoreError, Result};
pub use inputs::ModelInputs;
pub use model::Model;
pub use seed::Seed;
pub use slices::{Anchor, Cut, LayerId, Slice};
