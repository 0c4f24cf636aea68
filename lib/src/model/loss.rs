use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Error, Result};

fn check_same_shape(prediction: &ArrayView2<f32>, target: &ArrayView2<f32>) -> Result<()> {
  if prediction.nrows() != target.nrows() {
    return Err(Error::ShapeMismatch {
      context: "loss rows",
      expected: prediction.nrows(),
      found: target.nrows(),
    });
  }
  if prediction.ncols() != target.ncols() {
    return Err(Error::ShapeMismatch {
      context: "loss columns",
      expected: prediction.ncols(),
      found: target.ncols(),
    });
  }
  if prediction.is_empty() {
    return Err(Error::invalid("cannot take the loss of an empty batch"));
  }
  Ok(())
}

/// Mean squared error: averaged over channels, then over the batch.
pub fn mse(prediction: ArrayView2<f32>, target: ArrayView2<f32>) -> Result<f32> {
  check_same_shape(&prediction, &target)?;
  let squared = (&prediction - &target).mapv(|d| d * d);
  let per_sample = squared
    .mean_axis(Axis(1))
    .ok_or_else(|| Error::invalid("empty channel axis"))?;
  per_sample
    .mean()
    .ok_or_else(|| Error::invalid("empty batch axis"))
}

/// Gradient of [`mse`] with respect to the prediction.
pub fn mse_gradient(prediction: ArrayView2<f32>, target: ArrayView2<f32>) -> Result<Array2<f32>> {
  check_same_shape(&prediction, &target)?;
  let scale = 2.0 / prediction.len() as f32;
  Ok((&prediction - &target) * scale)
}
