use ndarray::{aview1, Array2, ArrayView2, Axis};
use rand::Rng;
use tracing::trace;

use super::{
  layer::{Activation, Layer, LayerGradients},
  loss::{mse, mse_gradient},
};
use crate::{
  color::Rgb,
  dataset::{Batch, CHANNELS},
  error::{Error, Result},
};

/// Widths of the network: RGB in, three hidden ReLU layers, RGB out.
pub const LAYER_WIDTHS: [usize; 5] = [CHANNELS, 64, 32, 16, CHANNELS];

/// Fully-connected ReLU regression network mapping a normalized color to its
/// predicted complement.
///
/// Layer `i`'s output width always equals layer `i + 1`'s input width, the
/// first layer reads three channels and the last layer clamps three channels
/// into `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementNet {
  layers: Vec<Layer>,
}

impl ComplementNet {
  /// The 3 -> 64 -> 32 -> 16 -> 3 network, He-initialized.
  pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
    Self::with_widths(&LAYER_WIDTHS, rng)
  }

  pub fn with_widths<R: Rng + ?Sized>(widths: &[usize], rng: &mut R) -> Result<Self> {
    if widths.len() < 2 {
      return Err(Error::invalid("a network needs at least an input and an output width"));
    }
    let last = widths.len() - 2;
    let layers = widths
      .windows(2)
      .enumerate()
      .map(|(i, pair)| {
        let activation = if i == last {
          Activation::ClampedRelu
        } else {
          Activation::Relu
        };
        Layer::he(pair[0], pair[1], activation, &mut *rng)
      })
      .collect::<Result<Vec<_>>>()?;
    Self::from_layers(layers)
  }

  /// Builds a network from explicit layers. The widths must chain from RGB in
  /// to RGB out and the last layer must clamp.
  pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
    let (first, last) = match (layers.first(), layers.last()) {
      (Some(first), Some(last)) => (first, last),
      _ => return Err(Error::invalid("a network needs at least one layer")),
    };
    for pair in layers.windows(2) {
      if pair[0].fan_out() != pair[1].fan_in() {
        return Err(Error::ShapeMismatch {
          context: "layer chain",
          expected: pair[0].fan_out(),
          found: pair[1].fan_in(),
        });
      }
    }
    if first.fan_in() != CHANNELS {
      return Err(Error::ShapeMismatch {
        context: "network input width",
        expected: CHANNELS,
        found: first.fan_in(),
      });
    }
    if last.fan_out() != CHANNELS {
      return Err(Error::ShapeMismatch {
        context: "network output width",
        expected: CHANNELS,
        found: last.fan_out(),
      });
    }
    if last.activation() != Activation::ClampedRelu {
      return Err(Error::invalid(format!(
        "output layer must be {:?}, found {:?}",
        Activation::ClampedRelu,
        last.activation()
      )));
    }
    Ok(Self { layers })
  }

  pub fn layers(&self) -> &[Layer] {
    &self.layers
  }

  pub fn input_width(&self) -> usize {
    self.layers[0].fan_in()
  }

  pub fn output_width(&self) -> usize {
    self.layers[self.layers.len() - 1].fan_out()
  }

  fn check_input(&self, input: &ArrayView2<f32>) -> Result<()> {
    if input.ncols() != self.input_width() {
      return Err(Error::ShapeMismatch {
        context: "batch input width",
        expected: self.input_width(),
        found: input.ncols(),
      });
    }
    if input.nrows() == 0 {
      return Err(Error::invalid("empty batch"));
    }
    Ok(())
  }

  /// Predictions for a `[batch, 3]` input, every value in `[0, 1]`.
  pub fn forward(&self, input: ArrayView2<f32>) -> Result<Array2<f32>> {
    self.check_input(&input)?;
    Ok(self.propagate(input))
  }

  fn propagate(&self, input: ArrayView2<f32>) -> Array2<f32> {
    let mut activation = self.layers[0].forward(input);
    for layer in &self.layers[1..] {
      activation = layer.forward(activation.view());
    }
    activation
  }

  /// The model's complement of a single color, denormalized to integers.
  pub fn predict_rgb(&self, rgb: Rgb) -> Rgb {
    let normalized = rgb.normalized();
    let input = aview1(&normalized).insert_axis(Axis(0));
    let output = self.propagate(input);
    Rgb::from_normalized([output[[0, 0]], output[[0, 1]], output[[0, 2]]])
  }

  pub fn loss(&self, batch: Batch<'_>) -> Result<f32> {
    let prediction = self.forward(batch.inputs)?;
    mse(prediction.view(), batch.targets)
  }

  /// Cost of `batch` under the current parameters and the gradient of that
  /// cost w.r.t. every weight and bias, first layer first.
  pub fn gradients(&self, batch: Batch<'_>) -> Result<(f32, Vec<LayerGradients>)> {
    self.check_input(&batch.inputs)?;
    if batch.targets.nrows() != batch.inputs.nrows() {
      return Err(Error::ShapeMismatch {
        context: "batch target rows",
        expected: batch.inputs.nrows(),
        found: batch.targets.nrows(),
      });
    }

    let mut traces = Vec::with_capacity(self.layers.len());
    let mut activation = batch.inputs.to_owned();
    for layer in &self.layers {
      let (output, trace) = layer.forward_traced(activation.view());
      traces.push(trace);
      activation = output;
    }

    let cost = mse(activation.view(), batch.targets)?;
    let mut grad = mse_gradient(activation.view(), batch.targets)?;
    let mut gradients = Vec::with_capacity(self.layers.len());
    for (layer, trace) in self.layers.iter().zip(traces.iter()).rev() {
      let (layer_gradients, grad_input) = layer.backward(trace, &grad);
      gradients.push(layer_gradients);
      grad = grad_input;
    }
    gradients.reverse();
    Ok((cost, gradients))
  }

  /// `param -= rate * gradient` for every parameter.
  pub fn apply_gradients(&mut self, gradients: &[LayerGradients], rate: f32) -> Result<()> {
    if gradients.len() != self.layers.len() {
      return Err(Error::ShapeMismatch {
        context: "gradient layers",
        expected: self.layers.len(),
        found: gradients.len(),
      });
    }
    for (layer, g) in self.layers.iter().zip(gradients) {
      if g.weights.dim() != layer.weights.dim() {
        return Err(Error::ShapeMismatch {
          context: "gradient weights",
          expected: layer.weights.len(),
          found: g.weights.len(),
        });
      }
      if g.bias.len() != layer.bias.len() {
        return Err(Error::ShapeMismatch {
          context: "gradient bias",
          expected: layer.bias.len(),
          found: g.bias.len(),
        });
      }
    }
    for (layer, g) in self.layers.iter_mut().zip(gradients) {
      layer.apply_gradients(g, rate);
    }
    Ok(())
  }

  /// One gradient-descent update against `batch`.
  ///
  /// The cost (taken before the update) is only returned when `fetch_cost` is
  /// set.
  pub fn train_step(
    &mut self,
    batch: Batch<'_>,
    rate: f32,
    fetch_cost: bool,
  ) -> Result<Option<f32>> {
    let (cost, gradients) = self.gradients(batch)?;
    self.apply_gradients(&gradients, rate)?;
    trace!(rows = batch.len(), rate, "applied batch update");
    Ok(fetch_cost.then_some(cost))
  }

  pub fn is_finite(&self) -> bool {
    self.layers.iter().all(Layer::is_finite)
  }
}
