//! # gradlens
//!
//! Gradient-based attribution for instrumented models.
//!
//! gradlens answers "how sensitive is this quantity to that part of the
//! model?" by composing four pieces:
//!
//! - **Cut / Slice**: name two computation points in a model
//! - **DoI** (distribution of interest): generate variants of the value at
//!   the source cut (a point, a linear path, Gaussian samples, ...)
//! - **QoI** (quantity of interest): reduce the destination cut's value to
//!   one scalar per example
//! - **InternalInfluence**: average the QoI's gradients over the DoI's
//!   variants, optionally weighted by the original activation
//!
//! The model itself is consumed through the minimal
//! [`Model`](gradlens_core::Model) capability; gradlens never hooks into a
//! framework directly.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gradlens::prelude::*;
//!
//! let infl = InternalInfluence::new(
//!     model,
//!     (Cut::named("conv3"), Cut::output()),
//!     ClassQoi::new(target),
//!     LinearDoi::new(32),
//! );
//! let attribution = infl.attributions(&inputs)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub use gradlens_attrib as attrib;
pub use gradlens_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use gradlens::prelude::*;
/// ```
pub mod prelude {
    pub use gradlens_core::{Anchor, Cut, LayerId, Model, ModelInputs, Seed, Slice};

    pub use gradlens_attrib::{
        AttribError, Baseline, ClassQoi, ComparativeQoi, Doi, GaussianDoi, InfluenceConfig,
        InternalChannelQoi, InternalInfluence, LambdaQoi, LinearDoi, MaxClassQoi, PointDoi, Qoi,
        SumQoi,
    };
}
