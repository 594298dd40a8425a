//! Quantity-of-interest strategies.
//!
//! A QoI reduces the value at the slice's destination cut to one scalar per
//! example; the influence orchestrator differentiates that scalar back to
//! the source cut. Any differentiable function of the cut value works; a
//! non-differentiable choice only fails when the gradient is actually
//! taken, never at construction.

use std::sync::Arc;

use burn::prelude::*;

use gradlens_core::ModelInputs;

use crate::error::{AttribError, Result};

/// A strategy reducing a cut's value to a per-example scalar.
///
/// `eval` receives the `(B, U)` value at the destination cut and returns a
/// `(B,)` vector, one scalar per example. The model-inputs snapshot is
/// available for quantities that need more than the cut value; most ignore
/// it.
pub trait Qoi<B: Backend>: Send + Sync {
    /// Reduce `y` to one scalar per example.
    fn eval(&self, y: Tensor<B, 2>, model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>>;
}

/// Sum of all units per example.
///
/// The identity quantity for elementwise chains: seeding the backward pass
/// with ones gives each unit's own derivative.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumQoi;

impl SumQoi {
    /// Create the sum quantity.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Qoi<B> for SumQoi {
    fn eval(&self, y: Tensor<B, 2>, _model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>> {
        let q: Tensor<B, 1> = y.sum_dim(1).squeeze(1);
        Ok(q)
    }
}

/// The output unit for one class.
#[derive(Debug, Clone, Copy)]
pub struct ClassQoi {
    class: usize,
}

impl ClassQoi {
    /// Quantity selecting output column `class`.
    #[must_use]
    pub fn new(class: usize) -> Self {
        Self { class }
    }
}

impl<B: Backend> Qoi<B> for ClassQoi {
    fn eval(&self, y: Tensor<B, 2>, _model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>> {
        let [batch, units] = y.dims();
        if self.class >= units {
            return Err(AttribError::Configuration {
                cut: "output".to_string(),
                reason: format!("class {} out of range for {units} output units", self.class),
            });
        }
        let q: Tensor<B, 1> = y.slice([0..batch, self.class..self.class + 1]).squeeze(1);
        Ok(q)
    }
}

/// The maximum output unit per example.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxClassQoi;

impl MaxClassQoi {
    /// Quantity selecting each example's largest output unit.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Qoi<B> for MaxClassQoi {
    fn eval(&self, y: Tensor<B, 2>, _model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>> {
        let q: Tensor<B, 1> = y.max_dim(1).squeeze(1);
        Ok(q)
    }
}

/// Difference between two output units, `a - b`.
///
/// Measures what pushes the model towards class `a` over class `b`.
#[derive(Debug, Clone, Copy)]
pub struct ComparativeQoi {
    a: usize,
    b: usize,
}

impl ComparativeQoi {
    /// Quantity comparing output column `a` against column `b`.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }
}

impl<B: Backend> Qoi<B> for ComparativeQoi {
    fn eval(&self, y: Tensor<B, 2>, model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>> {
        let qa = ClassQoi::new(self.a).eval(y.clone(), model_inputs)?;
        let qb = ClassQoi::new(self.b).eval(y, model_inputs)?;
        Ok(qa - qb)
    }
}

/// One internal unit, for attributing influence onto a single channel of an
/// internal cut.
#[derive(Debug, Clone, Copy)]
pub struct InternalChannelQoi {
    channel: usize,
}

impl InternalChannelQoi {
    /// Quantity selecting internal unit `channel`.
    #[must_use]
    pub fn new(channel: usize) -> Self {
        Self { channel }
    }
}

impl<B: Backend> Qoi<B> for InternalChannelQoi {
    fn eval(&self, y: Tensor<B, 2>, _model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>> {
        let [batch, units] = y.dims();
        if self.channel >= units {
            return Err(AttribError::Configuration {
                cut: "cut".to_string(),
                reason: format!(
                    "channel {} out of range for {units} units at the cut",
                    self.channel
                ),
            });
        }
        let q: Tensor<B, 1> = y.slice([0..batch, self.channel..self.channel + 1]).squeeze(1);
        Ok(q)
    }
}

/// An arbitrary differentiable function of the cut value.
#[derive(Clone)]
pub struct LambdaQoi<B: Backend> {
    #[allow(clippy::type_complexity)]
    f: Arc<dyn Fn(&Tensor<B, 2>, &ModelInputs<B>) -> Tensor<B, 1> + Send + Sync>,
}

impl<B: Backend> LambdaQoi<B> {
    /// Wrap a closure mapping the cut value (and model inputs) to a
    /// per-example scalar.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Tensor<B, 2>, &ModelInputs<B>) -> Tensor<B, 1> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

impl<B: Backend> std::fmt::Debug for LambdaQoi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LambdaQoi(..)")
    }
}

impl<B: Backend> Qoi<B> for LambdaQoi<B> {
    fn eval(&self, y: Tensor<B, 2>, model_inputs: &ModelInputs<B>) -> Result<Tensor<B, 1>> {
        Ok((self.f)(&y, model_inputs))
    }
}
