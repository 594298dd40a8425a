//! Model capability trait.
//!
//! The engine never hooks into a specific framework itself; it consumes a
//! model through this minimal contract. An implementation wraps whatever
//! instrumentation the underlying framework offers and exposes named cut
//! values plus re-evaluation between cuts.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::error::Result;
use crate::inputs::ModelInputs;
use crate::slices::Cut;

/// Capability contract for an instrumented model.
///
/// Implementations must resolve [`Cut`]s against their own topology and
/// reject slices whose destination is not reachable from the source with
/// [`CoreError::UnreachableCut`](crate::CoreError::UnreachableCut).
///
/// The contract is reentrant-by-requirement: implementations must tolerate
/// concurrent read-only use, since the attribution objects built on top of
/// them are freely shared.
pub trait Model<B: AutodiffBackend> {
    /// Evaluate the model forward from its inputs to `cut`, returning the
    /// value observed there.
    fn forward_to(&self, cut: &Cut, inputs: &ModelInputs<B>) -> Result<Tensor<B, 2>>;

    /// Evaluate the model from `from` to `to`, injecting `from_value` at
    /// the source cut.
    ///
    /// The caller enables gradient tracking on `from_value`; the
    /// implementation must keep the computation on the autodiff tape so the
    /// destination value can be differentiated back to the source.
    fn forward_between(&self, from: &Cut, to: &Cut, from_value: Tensor<B, 2>)
        -> Result<Tensor<B, 2>>;
}
