use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};

/// Nonlinearity applied after the affine transform of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
  Relu,
  /// `min(1, max(0, x))`: a ReLU whose output is also a valid normalized color.
  ClampedRelu,
}

impl Activation {
  pub fn apply(self, z: &Array2<f32>) -> Array2<f32> {
    match self {
      Activation::Relu => z.mapv(|x| x.max(0.0)),
      Activation::ClampedRelu => z.mapv(|x| x.max(0.0).min(1.0)),
    }
  }

  /// Multiplies the upstream gradient by the activation's derivative at `z`.
  pub fn backward(self, z: &Array2<f32>, upstream: &Array2<f32>) -> Array2<f32> {
    let mut grad = upstream.clone();
    match self {
      Activation::Relu => Zip::from(&mut grad).and(z).for_each(|g, &x| {
        if x <= 0.0 {
          *g = 0.0;
        }
      }),
      Activation::ClampedRelu => Zip::from(&mut grad).and(z).for_each(|g, &x| {
        if x <= 0.0 || x >= 1.0 {
          *g = 0.0;
        }
      }),
    }
    grad
  }
}

/// Weights `[fan_in, fan_out]` and bias `[fan_out]` of one fully-connected layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
  pub(crate) weights: Array2<f32>,
  pub(crate) bias: Array1<f32>,
  pub(crate) activation: Activation,
}

/// Values recorded by the forward pass that backpropagation needs.
#[derive(Debug, Clone)]
pub(crate) struct LayerTrace {
  pub input: Array2<f32>,
  pub pre_activation: Array2<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
  pub weights: Array2<f32>,
  pub bias: Array1<f32>,
}

impl Layer {
  /// He initialization: weights from `N(0, sqrt(2 / fan_in))`, zero bias vector.
  pub fn he<R: Rng + ?Sized>(
    fan_in: usize,
    fan_out: usize,
    activation: Activation,
    rng: &mut R,
  ) -> Result<Self> {
    if fan_in == 0 || fan_out == 0 {
      return Err(Error::invalid(format!(
        "layer widths must be positive, got {fan_in}x{fan_out}"
      )));
    }
    let std_dev = (2.0 / fan_in as f32).sqrt();
    let normal = Normal::new(0.0, std_dev).map_err(|e| Error::invalid(e.to_string()))?;
    let weights = Array2::from_shape_simple_fn((fan_in, fan_out), || normal.sample(&mut *rng));
    Ok(Self {
      weights,
      bias: Array1::zeros(fan_out),
      activation,
    })
  }

  pub fn from_parts(
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
  ) -> Result<Self> {
    if weights.ncols() != bias.len() {
      return Err(Error::ShapeMismatch {
        context: "layer bias",
        expected: weights.ncols(),
        found: bias.len(),
      });
    }
    Ok(Self {
      weights,
      bias,
      activation,
    })
  }

  pub fn fan_in(&self) -> usize {
    self.weights.nrows()
  }

  pub fn fan_out(&self) -> usize {
    self.weights.ncols()
  }

  pub fn weights(&self) -> ArrayView2<'_, f32> {
    self.weights.view()
  }

  pub fn bias(&self) -> &Array1<f32> {
    &self.bias
  }

  pub fn activation(&self) -> Activation {
    self.activation
  }

  /// `activation(input . W + b)`. The caller has checked the input width.
  pub(crate) fn forward(&self, input: ArrayView2<f32>) -> Array2<f32> {
    self.activation.apply(&self.affine(input))
  }

  pub(crate) fn forward_traced(&self, input: ArrayView2<f32>) -> (Array2<f32>, LayerTrace) {
    let pre_activation = self.affine(input);
    let output = self.activation.apply(&pre_activation);
    let trace = LayerTrace {
      input: input.to_owned(),
      pre_activation,
    };
    (output, trace)
  }

  /// Returns the parameter gradients and the gradient w.r.t. the layer input.
  pub(crate) fn backward(
    &self,
    trace: &LayerTrace,
    grad_output: &Array2<f32>,
  ) -> (LayerGradients, Array2<f32>) {
    let grad_z = self.activation.backward(&trace.pre_activation, grad_output);
    let gradients = LayerGradients {
      weights: trace.input.t().dot(&grad_z),
      bias: grad_z.sum_axis(Axis(0)),
    };
    let grad_input = grad_z.dot(&self.weights.t());
    (gradients, grad_input)
  }

  pub(crate) fn apply_gradients(&mut self, gradients: &LayerGradients, rate: f32) {
    self.weights.scaled_add(-rate, &gradients.weights);
    self.bias.scaled_add(-rate, &gradients.bias);
  }

  pub(crate) fn is_finite(&self) -> bool {
    self.weights.iter().chain(self.bias.iter()).all(|v| v.is_finite())
  }

  fn affine(&self, input: ArrayView2<f32>) -> Array2<f32> {
    input.dot(&self.weights) + &self.bias
  }
}
