//! Distribution-of-interest strategies.
//!
//! A DoI turns the value observed at a cut into an ordered sequence of
//! variants; the influence orchestrator averages gradients over that
//! sequence. The provided strategies cover the common cases (a single
//! point, a linear interpolation path, Gaussian samples); user-defined
//! strategies implement [`Doi`] directly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use burn::prelude::*;
use ndarray::Array2;
use rand_chacha::ChaCha8Rng;
use rand_distr::Distribution as _;
use rand_distr::Normal;

use gradlens_core::{Cut, ModelInputs, Seed};

use crate::error::{AttribError, Result};

/// A strategy generating variants of a cut's value.
///
/// `generate` receives the value `z` observed at the cut for one model
/// evaluation, plus the snapshot of the original call arguments. A strategy
/// may ignore `z` entirely and derive its variants from `model_inputs`
/// instead (e.g. substituting an upstream value); that is negotiated only
/// through the explicit parameter, never through shared state.
///
/// Deterministic strategies must produce the original value as their first
/// variant unless they deliberately substitute model inputs.
pub trait Doi<B: Backend>: Send + Sync {
    /// The cut this strategy is bound to, if any.
    ///
    /// A bound strategy must agree with the slice it is used with; the
    /// orchestrator rejects a mismatch on the first attribution call. An
    /// unbound strategy applies at whatever cut the slice starts from.
    fn cut(&self) -> Option<&Cut> {
        None
    }

    /// Number of variants `generate` produces.
    fn resolution(&self) -> usize {
        1
    }

    /// Generate the ordered sequence of variants of `z`.
    fn generate(&self, z: Tensor<B, 2>, model_inputs: &ModelInputs<B>)
        -> Result<Vec<Tensor<B, 2>>>;
}

/// The trivial distribution: the cut value itself, unchanged.
///
/// Used with no activation weighting this produces a plain
/// gradient-at-a-point.
#[derive(Debug, Clone, Default)]
pub struct PointDoi {
    cut: Option<Cut>,
}

impl PointDoi {
    /// Create a point distribution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the strategy to a cut.
    #[must_use]
    pub fn with_cut(mut self, cut: Cut) -> Self {
        self.cut = Some(cut);
        self
    }
}

impl<B: Backend> Doi<B> for PointDoi {
    fn cut(&self) -> Option<&Cut> {
        self.cut.as_ref()
    }

    fn generate(
        &self,
        z: Tensor<B, 2>,
        _model_inputs: &ModelInputs<B>,
    ) -> Result<Vec<Tensor<B, 2>>> {
        Ok(vec![z])
    }
}

/// Reference point a [`LinearDoi`] interpolates towards.
pub enum Baseline<B: Backend> {
    /// The all-zero tensor shaped like the cut value. The default.
    Zeros,
    /// A fixed tensor, shape-checked against the cut value per call.
    Fixed(Tensor<B, 2>),
    /// A baseline computed per call from the cut value and the model
    /// inputs, enabling input-dependent ("nearby") baselines.
    #[allow(clippy::type_complexity)]
    Compute(Arc<dyn Fn(&Tensor<B, 2>, &ModelInputs<B>) -> Tensor<B, 2> + Send + Sync>),
}

impl<B: Backend> Clone for Baseline<B> {
    fn clone(&self) -> Self {
        match self {
            Self::Zeros => Self::Zeros,
            Self::Fixed(t) => Self::Fixed(t.clone()),
            Self::Compute(f) => Self::Compute(Arc::clone(f)),
        }
    }
}

impl<B: Backend> fmt::Debug for Baseline<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zeros => write!(f, "Baseline::Zeros"),
            Self::Fixed(t) => write!(f, "Baseline::Fixed({:?})", t.dims()),
            Self::Compute(_) => write!(f, "Baseline::Compute(..)"),
        }
    }
}

/// Linear interpolation from the cut value to a baseline.
///
/// Produces `resolution` points inclusive of both ends:
/// `point[i] = z + (i / (resolution - 1)) * (baseline - z)`, so the first
/// point is the original value and the last is the baseline. A resolution
/// of 1 degenerates to the point distribution. Averaging gradients over
/// this path yields Integrated Gradients.
#[derive(Debug, Clone)]
pub struct LinearDoi<B: Backend> {
    baseline: Baseline<B>,
    resolution: usize,
    cut: Option<Cut>,
}

impl<B: Backend> LinearDoi<B> {
    /// Create a linear path with the given resolution and a zero baseline.
    #[must_use]
    pub fn new(resolution: usize) -> Self {
        Self {
            baseline: Baseline::Zeros,
            resolution,
            cut: None,
        }
    }

    /// Interpolate towards a fixed baseline tensor.
    #[must_use]
    pub fn with_baseline(mut self, baseline: Tensor<B, 2>) -> Self {
        self.baseline = Baseline::Fixed(baseline);
        self
    }

    /// Interpolate towards a baseline computed per call.
    #[must_use]
    pub fn with_baseline_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Tensor<B, 2>, &ModelInputs<B>) -> Tensor<B, 2> + Send + Sync + 'static,
    {
        self.baseline = Baseline::Compute(Arc::new(f));
        self
    }

    /// Bind the strategy to a cut.
    #[must_use]
    pub fn with_cut(mut self, cut: Cut) -> Self {
        self.cut = Some(cut);
        self
    }

    fn cut_label(&self) -> String {
        self.cut
            .as_ref()
            .map_or_else(|| Cut::input().to_string(), ToString::to_string)
    }
}

impl<B: Backend> Default for LinearDoi<B> {
    fn default() -> Self {
        Self::new(10)
    }
}

impl<B: Backend> Doi<B> for LinearDoi<B> {
    fn cut(&self) -> Option<&Cut> {
        self.cut.as_ref()
    }

    fn resolution(&self) -> usize {
        self.resolution
    }

    fn generate(
        &self,
        z: Tensor<B, 2>,
        model_inputs: &ModelInputs<B>,
    ) -> Result<Vec<Tensor<B, 2>>> {
        if self.resolution == 0 {
            return Err(AttribError::Configuration {
                cut: self.cut_label(),
                reason: "linear distribution requires a resolution of at least 1".to_string(),
            });
        }

        let baseline = match &self.baseline {
            Baseline::Zeros => z.zeros_like(),
            Baseline::Fixed(t) => {
                if t.dims() != z.dims() {
                    return Err(AttribError::Configuration {
                        cut: self.cut_label(),
                        reason: format!(
                            "baseline shape {:?} does not match cut value shape {:?}",
                            t.dims(),
                            z.dims()
                        ),
                    });
                }
                t.clone()
            }
            Baseline::Compute(f) => f(&z, model_inputs),
        };

        if self.resolution == 1 {
            return Ok(vec![z]);
        }

        let diff = baseline - z.clone();
        let last = (self.resolution - 1) as f32;
        Ok((0..self.resolution)
            .map(|i| z.clone() + diff.clone() * (i as f32 / last))
            .collect())
    }
}

/// I.i.d. Gaussian samples around the cut value.
///
/// Produces `resolution` samples of `z + Normal(0, var)` per coordinate,
/// shape-preserving. Accepts either a backend tensor (via [`Doi`]) or a
/// plain array (via [`GaussianDoi::generate_array`]) and returns the
/// matching representation. Averaging gradients over the samples yields
/// Expected Gradients.
///
/// Each call draws from a fresh ChaCha stream of the held [`Seed`], so
/// repeated calls sample fresh noise while staying reproducible for a
/// fixed construction.
#[derive(Debug)]
pub struct GaussianDoi {
    var: f32,
    resolution: usize,
    seed: Seed,
    cut: Option<Cut>,
    calls: AtomicU64,
}

impl GaussianDoi {
    /// Create a Gaussian distribution with the given variance and
    /// resolution.
    #[must_use]
    pub fn new(var: f32, resolution: usize) -> Self {
        Self {
            var,
            resolution,
            seed: Seed::from_entropy(),
            cut: None,
            calls: AtomicU64::new(0),
        }
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Bind the strategy to a cut.
    #[must_use]
    pub fn with_cut(mut self, cut: Cut) -> Self {
        self.cut = Some(cut);
        self
    }

    /// Generate variants of a plain-array cut value.
    ///
    /// Same sampling semantics as the tensor path; the caller gets arrays
    /// back because it supplied an array.
    pub fn generate_array(&self, z: &Array2<f32>) -> Result<Vec<Array2<f32>>> {
        let (mut rng, normal) = self.sampler()?;
        let mut variants = Vec::with_capacity(self.resolution);
        for _ in 0..self.resolution {
            let noise = Array2::from_shape_fn(z.dim(), |_| normal.sample(&mut rng));
            variants.push(z + &noise);
        }
        Ok(variants)
    }

    fn sampler(&self) -> Result<(ChaCha8Rng, Normal<f32>)> {
        if !self.var.is_finite() || self.var < 0.0 {
            return Err(AttribError::Configuration {
                cut: self.cut_label(),
                reason: format!("variance must be finite and non-negative, got {}", self.var),
            });
        }
        let normal = Normal::new(0.0, self.var.sqrt()).map_err(|e| AttribError::Configuration {
            cut: self.cut_label(),
            reason: format!("invalid variance {}: {e}", self.var),
        })?;
        let stream = self.calls.fetch_add(1, Ordering::Relaxed);
        Ok((self.seed.to_stream_rng(stream), normal))
    }

    fn cut_label(&self) -> String {
        self.cut
            .as_ref()
            .map_or_else(|| Cut::input().to_string(), ToString::to_string)
    }
}

impl<B: Backend> Doi<B> for GaussianDoi {
    fn cut(&self) -> Option<&Cut> {
        self.cut.as_ref()
    }

    fn resolution(&self) -> usize {
        self.resolution
    }

    fn generate(
        &self,
        z: Tensor<B, 2>,
        _model_inputs: &ModelInputs<B>,
    ) -> Result<Vec<Tensor<B, 2>>> {
        let dims = z.dims();
        let n = dims[0] * dims[1];
        let device = z.device();

        let (mut rng, normal) = self.sampler()?;
        let mut variants = Vec::with_capacity(self.resolution);
        for _ in 0..self.resolution {
            let noise: Vec<f32> = (0..n).map(|_| normal.sample(&mut rng)).collect();
            let noise: Tensor<B, 2> =
                Tensor::<B, 1>::from_floats(noise.as_slice(), &device).reshape(dims);
            variants.push(z.clone() + noise);
        }
        Ok(variants)
    }
}
