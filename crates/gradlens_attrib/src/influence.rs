//! The internal influence orchestrator.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use gradlens_core::backend::{gradient, to_array, to_tensor};
use gradlens_core::{Model, ModelInputs, Slice};

use crate::doi::Doi;
use crate::error::{AttribError, Result};
use crate::qoi::Qoi;

/// Options for an influence computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InfluenceConfig {
    /// Weight the averaged gradient elementwise by the original
    /// (pre-perturbation) activation at the source cut.
    pub multiply_activation: bool,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            multiply_activation: true,
        }
    }
}

/// Gradient-based attribution of a quantity of interest onto a cut.
///
/// Composes a model, a slice, a distribution of interest, and a quantity of
/// interest into the single operation [`attributions`]. Holding it mutates
/// nothing: every call recomputes from scratch, and the object can be shared
/// read-only across concurrent calls as long as the model capability is
/// reentrant.
///
/// With a [`LinearDoi`](crate::LinearDoi) this computes Integrated
/// Gradients; with a [`GaussianDoi`](crate::GaussianDoi) (or any other
/// sampled distribution) it computes Expected Gradients; with a
/// [`PointDoi`](crate::PointDoi) at the output it reduces to a plain
/// gradient.
///
/// [`attributions`]: InternalInfluence::attributions
pub struct InternalInfluence<B, M>
where
    B: AutodiffBackend,
    M: Model<B>,
{
    model: M,
    slice: Slice,
    qoi: Box<dyn Qoi<B>>,
    doi: Box<dyn Doi<B>>,
    multiply_activation: bool,
}

impl<B, M> InternalInfluence<B, M>
where
    B: AutodiffBackend,
    M: Model<B>,
{
    /// Compose an influence computation. Activation weighting defaults to
    /// on.
    pub fn new(
        model: M,
        slice: impl Into<Slice>,
        qoi: impl Qoi<B> + 'static,
        doi: impl Doi<B> + 'static,
    ) -> Self {
        Self {
            model,
            slice: slice.into(),
            qoi: Box::new(qoi),
            doi: Box::new(doi),
            multiply_activation: true,
        }
    }

    /// Compose with explicit options.
    pub fn from_config(
        model: M,
        slice: impl Into<Slice>,
        qoi: impl Qoi<B> + 'static,
        doi: impl Doi<B> + 'static,
        config: InfluenceConfig,
    ) -> Self {
        Self::new(model, slice, qoi, doi).with_multiply_activation(config.multiply_activation)
    }

    /// Toggle activation weighting.
    #[must_use]
    pub fn with_multiply_activation(mut self, multiply_activation: bool) -> Self {
        self.multiply_activation = multiply_activation;
        self
    }

    /// The slice this influence is computed over.
    #[must_use]
    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    /// Compute the attribution tensor for one model call.
    ///
    /// The result is shaped like the value at the slice's source cut, with
    /// the leading batch dimension preserved. Each distribution variant is
    /// evaluated sequentially: one forward pass to the destination cut, one
    /// quantity reduction, one backward pass to the variant. The gradient
    /// is taken at the variant actually fed forward, never at the original
    /// cut value, so a distribution that substitutes unrelated values (e.g.
    /// the model inputs) still differentiates at the right point. The
    /// activation weight, by contrast, always uses the original
    /// pre-perturbation value.
    ///
    /// # Errors
    ///
    /// - [`AttribError::Configuration`] if the distribution disagrees with
    ///   the slice or produces a sequence of the wrong length
    /// - [`AttribError::Shape`] if a variant's shape differs from the cut
    ///   value's
    /// - [`AttribError::Differentiation`] if the backend cannot connect the
    ///   quantity back to a variant
    /// - [`AttribError::Core`] if a cut does not resolve or the slice is
    ///   unreachable in the model's topology
    pub fn attributions(&self, inputs: &ModelInputs<B>) -> Result<Tensor<B::InnerBackend, 2>> {
        let from = self.slice.from_cut();
        let to = self.slice.to_cut();

        if let Some(cut) = self.doi.cut() {
            if cut != from {
                return Err(AttribError::Configuration {
                    cut: cut.to_string(),
                    reason: format!(
                        "distribution is bound to {cut} but the slice starts at {from}"
                    ),
                });
            }
        }

        let z0 = self.model.forward_to(from, inputs)?;
        let dims = z0.dims();

        let variants = self.doi.generate(z0.clone(), inputs)?;
        if variants.len() != self.doi.resolution() {
            return Err(AttribError::Configuration {
                cut: from.to_string(),
                reason: format!(
                    "distribution declared resolution {} but produced {} variants",
                    self.doi.resolution(),
                    variants.len()
                ),
            });
        }
        let k = variants.len();
        debug!(%from, %to, resolution = k, "computing attributions");

        let mut acc: Option<Tensor<B::InnerBackend, 2>> = None;
        for (i, variant) in variants.into_iter().enumerate() {
            let got = variant.dims();
            if got != dims {
                return Err(AttribError::Shape {
                    cut: from.to_string(),
                    expected: dims.to_vec(),
                    got: got.to_vec(),
                });
            }

            let z = variant.require_grad();
            let y = self.model.forward_between(from, to, z.clone())?;
            let q = self.qoi.eval(y, inputs)?;
            let g = gradient(q, &z).ok_or_else(|| AttribError::Differentiation {
                cut: from.to_string(),
                operation: format!("gradient of the quantity of interest for variant {i}"),
            })?;
            trace!(variant = i, "gradient accumulated");

            acc = Some(match acc {
                Some(sum) => sum + g,
                None => g,
            });
        }

        let Some(sum) = acc else {
            return Err(AttribError::Configuration {
                cut: from.to_string(),
                reason: "distribution produced no variants".to_string(),
            });
        };

        let mut attribution = sum / k as f32;
        if self.multiply_activation {
            attribution = attribution * z0.inner();
        }
        Ok(attribution)
    }

    /// Compute attributions for plain-array inputs, returning a plain
    /// array.
    ///
    /// Convenience for callers living outside the tensor representation;
    /// conversion happens only at this boundary.
    pub fn attributions_array(
        &self,
        args: &[Array2<f32>],
        device: &B::Device,
    ) -> Result<Array2<f32>> {
        let inputs = ModelInputs::new(args.iter().map(|a| to_tensor::<B>(a, device)).collect());
        let attribution = self.attributions(&inputs)?;
        Ok(to_array(&attribution)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_autodiff::Autodiff;
    use burn_ndarray::NdArray;
    use ndarray::array;

    use gradlens_core::{CoreError, Cut};

    use crate::doi::{LinearDoi, PointDoi};
    use crate::qoi::SumQoi;

    type Ad = Autodiff<NdArray>;

    /// One dense scale layer followed by a square: out = (w * x)^2.
    #[derive(Clone, Copy)]
    struct ScaleSquare {
        w: f32,
    }

    impl ScaleSquare {
        fn hidden(&self, x: Tensor<Ad, 2>) -> Tensor<Ad, 2> {
            x * self.w
        }

        fn out(&self, h: Tensor<Ad, 2>) -> Tensor<Ad, 2> {
            h.powf_scalar(2.0)
        }
    }

    impl Model<Ad> for ScaleSquare {
        fn forward_to(
            &self,
            cut: &Cut,
            inputs: &ModelInputs<Ad>,
        ) -> gradlens_core::Result<Tensor<Ad, 2>> {
            let x = inputs
                .first()
                .ok_or_else(|| CoreError::Other("missing model input".to_string()))?
                .clone();
            match cut {
                Cut::Input => Ok(x),
                Cut::Layer { .. } if cut == &Cut::index(1) => Ok(self.hidden(x)),
                Cut::Output => Ok(self.out(self.hidden(x))),
                other => Err(CoreError::UnresolvedCut {
                    cut: other.to_string(),
                }),
            }
        }

        fn forward_between(
            &self,
            from: &Cut,
            to: &Cut,
            from_value: Tensor<Ad, 2>,
        ) -> gradlens_core::Result<Tensor<Ad, 2>> {
            match (from, to) {
                (a, b) if a == b => Ok(from_value),
                (Cut::Input, Cut::Output) => Ok(self.out(self.hidden(from_value))),
                (Cut::Input, h) if h == &Cut::index(1) => Ok(self.hidden(from_value)),
                (h, Cut::Output) if h == &Cut::index(1) => Ok(self.out(from_value)),
                _ => Err(CoreError::UnreachableCut {
                    from: from.to_string(),
                    to: to.to_string(),
                }),
            }
        }
    }

    fn inputs(device: &<Ad as Backend>::Device) -> ModelInputs<Ad> {
        to_tensor::<Ad>(&array![[1.0_f32, 2.0], [3.0, 4.0]], device).into()
    }

    fn assert_close(got: &Array2<f32>, expected: &Array2<f32>) {
        assert_eq!(got.dim(), expected.dim());
        for (g, e) in got.iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-3, "{got:?} != {expected:?}");
        }
    }

    #[test]
    fn test_point_gradient_at_hidden() {
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(
            model,
            (Cut::index(1), Cut::output()),
            SumQoi::new(),
            PointDoi::new(),
        )
        .with_multiply_activation(false);

        let attr = infl.attributions(&inputs(&device)).unwrap();

        // d (h^2) / d h = 2h with h = 3x.
        let expected = array![[6.0_f32, 12.0], [18.0, 24.0]];
        assert_close(&to_array(&attr).unwrap(), &expected);
    }

    #[test]
    fn test_multiply_activation_weights_by_z0() {
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let plain = InternalInfluence::new(
            model,
            (Cut::index(1), Cut::output()),
            SumQoi::new(),
            PointDoi::new(),
        )
        .with_multiply_activation(false);
        let weighted = InternalInfluence::from_config(
            model,
            (Cut::index(1), Cut::output()),
            SumQoi::new(),
            PointDoi::new(),
            InfluenceConfig::default(),
        );

        let plain = to_array(&plain.attributions(&inputs(&device)).unwrap()).unwrap();
        let weighted = to_array(&weighted.attributions(&inputs(&device)).unwrap()).unwrap();

        // h = 3x is the unperturbed activation.
        let z0 = array![[3.0_f32, 6.0], [9.0, 12.0]];
        assert_close(&weighted, &(plain * z0));
    }

    #[test]
    fn test_output_slice_point_doi_is_plain_gradient() {
        let device = Default::default();
        let model = ScaleSquare { w: 2.0 };
        let infl = InternalInfluence::new(
            model,
            (Cut::output(), Cut::output()),
            SumQoi::new(),
            PointDoi::new(),
        )
        .with_multiply_activation(false);

        let attr = infl.attributions(&inputs(&device)).unwrap();

        // d q / d out = 1 everywhere.
        assert_eq!(to_array(&attr).unwrap(), Array2::<f32>::ones((2, 2)));
    }

    #[test]
    fn test_linear_doi_integrates_quadratic_exactly() {
        // For out = (w x)^2 the gradient along the zero-baseline path is
        // linear in the interpolation coefficient, so the inclusive grid
        // averages to exactly half the endpoint gradient.
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(
            model,
            Slice::full(),
            SumQoi::new(),
            LinearDoi::new(11),
        )
        .with_multiply_activation(false);

        let attr = to_array(&infl.attributions(&inputs(&device)).unwrap()).unwrap();

        // mean_i 2 w^2 (i/10) x = w^2 x
        let expected = array![[9.0_f32, 18.0], [27.0, 36.0]];
        for (a, e) in attr.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-3, "{attr:?} != {expected:?}");
        }
    }

    #[test]
    fn test_deterministic_doi_repeats_exactly() {
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(
            model,
            Slice::full(),
            SumQoi::new(),
            LinearDoi::new(8),
        );

        let a = to_array(&infl.attributions(&inputs(&device)).unwrap()).unwrap();
        let b = to_array(&infl.attributions(&inputs(&device)).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_doi_cut_mismatch_is_config_error() {
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(
            model,
            Slice::full(),
            SumQoi::new(),
            PointDoi::new().with_cut(Cut::index(1)),
        );

        let err = infl.attributions(&inputs(&device)).unwrap_err();
        assert!(matches!(err, AttribError::Configuration { .. }));
    }

    #[test]
    fn test_unresolved_cut_surfaces_on_first_call() {
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        // Construction succeeds; the bad cut only fails once used.
        let infl = InternalInfluence::new(
            model,
            (Cut::named("missing"), Cut::output()),
            SumQoi::new(),
            PointDoi::new(),
        );

        let err = infl.attributions(&inputs(&device)).unwrap_err();
        assert!(matches!(
            err,
            AttribError::Core(CoreError::UnresolvedCut { .. })
        ));
    }

    #[test]
    fn test_unreachable_slice_is_core_error() {
        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(
            model,
            (Cut::output(), Cut::input()),
            SumQoi::new(),
            PointDoi::new(),
        );

        let err = infl.attributions(&inputs(&device)).unwrap_err();
        assert!(matches!(
            err,
            AttribError::Core(CoreError::UnreachableCut { .. })
        ));
    }

    #[test]
    fn test_variant_shape_mismatch_aborts() {
        struct BadShapeDoi;

        impl Doi<Ad> for BadShapeDoi {
            fn generate(
                &self,
                z: Tensor<Ad, 2>,
                _model_inputs: &ModelInputs<Ad>,
            ) -> Result<Vec<Tensor<Ad, 2>>> {
                let device = z.device();
                Ok(vec![Tensor::ones([1, 5], &device)])
            }
        }

        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(model, Slice::full(), SumQoi::new(), BadShapeDoi);

        let err = infl.attributions(&inputs(&device)).unwrap_err();
        assert!(matches!(err, AttribError::Shape { .. }));
    }

    #[test]
    fn test_declared_resolution_mismatch_is_config_error() {
        struct LyingDoi;

        impl Doi<Ad> for LyingDoi {
            fn resolution(&self) -> usize {
                3
            }

            fn generate(
                &self,
                z: Tensor<Ad, 2>,
                _model_inputs: &ModelInputs<Ad>,
            ) -> Result<Vec<Tensor<Ad, 2>>> {
                Ok(vec![z])
            }
        }

        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(model, Slice::full(), SumQoi::new(), LyingDoi);

        let err = infl.attributions(&inputs(&device)).unwrap_err();
        assert!(matches!(err, AttribError::Configuration { .. }));
    }

    #[test]
    fn test_constant_qoi_is_differentiation_error() {
        struct ConstantQoi;

        impl Qoi<Ad> for ConstantQoi {
            fn eval(
                &self,
                y: Tensor<Ad, 2>,
                _model_inputs: &ModelInputs<Ad>,
            ) -> Result<Tensor<Ad, 1>> {
                let [batch, _] = y.dims();
                Ok(Tensor::ones([batch], &y.device()))
            }
        }

        let device = Default::default();
        let model = ScaleSquare { w: 3.0 };
        let infl = InternalInfluence::new(
            model,
            (Cut::index(1), Cut::output()),
            ConstantQoi,
            PointDoi::new(),
        );

        // The quantity never touches the variant, so no gradient exists.
        let err = infl.attributions(&inputs(&device)).unwrap_err();
        assert!(matches!(err, AttribError::Differentiation { .. }));
    }

    #[test]
    fn test_influence_config_serde() {
        let config = InfluenceConfig::default();
        assert!(config.multiply_activation);

        let json = serde_json::to_string(&config).unwrap();
        let decoded: InfluenceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.multiply_activation, config.multiply_activation);
    }

    #[test]
    fn test_attributions_array_round_trip() {
        let device = Default::default();
        let model = ScaleSquare { w: 2.0 };
        let infl = InternalInfluence::new(
            model,
            (Cut::index(1), Cut::output()),
            SumQoi::new(),
            PointDoi::new(),
        )
        .with_multiply_activation(false);

        let x = array![[1.0_f32, 2.0]];
        let attr = infl.attributions_array(&[x], &device).unwrap();

        // h = 2x, d(h^2)/dh = 2h = 4x.
        assert_close(&attr, &array![[4.0_f32, 8.0]]);
    }
}
