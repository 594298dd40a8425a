//! Backend glue: array conversion, shape introspection, and the gradient op.
//!
//! The engine's own math runs on burn tensors; plain `ndarray` values cross
//! into and out of that representation only through the total conversion
//! functions here.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use ndarray::Array2;

use crate::error::{CoreError, Result};

/// Convert a plain array into a backend tensor on `device`.
pub fn to_tensor<B: Backend>(array: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = array.dim();
    let flat: Vec<f32> = array.iter().copied().collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows, cols])
}

/// Convert a backend tensor into a plain array.
///
/// # Errors
///
/// Returns [`CoreError::Conversion`] if the tensor's data cannot be read
/// back as `f32`.
pub fn to_array<B: Backend>(tensor: &Tensor<B, 2>) -> Result<Array2<f32>> {
    let [rows, cols] = tensor.dims();
    let flat = tensor
        .to_data()
        .to_vec::<f32>()
        .map_err(|e| CoreError::Conversion(format!("{e:?}")))?;
    Array2::from_shape_vec((rows, cols), flat)
        .map_err(|e| CoreError::Conversion(e.to_string()))
}

/// Shape of a cut value as `[batch, units]`.
#[must_use]
pub fn int_shape<B: Backend>(tensor: &Tensor<B, 2>) -> [usize; 2] {
    tensor.dims()
}

/// Gradient of `output` with respect to `wrt`.
///
/// The backward pass is seeded with ones, so a per-example output vector
/// `(B,)` yields per-example gradients in a single pass. Returns `None`
/// when the autodiff tape does not connect `output` to `wrt` (e.g. `wrt`
/// was never marked `require_grad`, or `output` does not depend on it).
///
/// An output that is not on the tape at all, such as a constant built
/// without touching any tracked tensor, has no backward pass to run.
pub fn gradient<B: AutodiffBackend>(
    output: Tensor<B, 1>,
    wrt: &Tensor<B, 2>,
) -> Option<Tensor<B::InnerBackend, 2>> {
    if !output.is_require_grad() {
        return None;
    }
    let grads = output.backward();
    wrt.grad(&grads)
}
