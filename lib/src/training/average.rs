/// Bias-corrected exponential moving average, used as the running cost
/// estimate between reporting steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialAverage {
  beta: f32,
  moment: f32,
  t: i32,
}

impl ExponentialAverage {
  pub fn new(beta: f32) -> Self {
    ExponentialAverage {
      beta,
      moment: 0.,
      t: 0,
    }
  }

  pub fn update(&mut self, value: f32) -> f32 {
    self.t += 1;
    self.moment = self.beta * self.moment + (1. - self.beta) * value;
    self.value().unwrap_or(value)
  }

  /// `None` until the first update.
  pub fn value(&self) -> Option<f32> {
    // bias correction
    (self.t > 0).then(|| self.moment / (1. - f32::powi(self.beta, self.t)))
  }

  pub fn reset(&mut self) {
    self.moment = 0.;
    self.t = 0;
  }
}

impl Default for ExponentialAverage {
  fn default() -> Self {
    Self::new(0.9)
  }
}
