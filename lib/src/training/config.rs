use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything a training session needs besides its random source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
  /// Samples generated for the session.
  pub dataset_size: usize,
  pub batch_size: usize,
  /// Number of full passes over the dataset before the session is done.
  pub steps: usize,
  /// Base rate of the step-decay schedule.
  pub learning_rate: f32,
  /// The mean cost is computed and reported on every `report_every`-th step.
  pub report_every: usize,
  /// Seeds both the dataset and the initial weights. Entropy when absent.
  pub seed: Option<u64>,
}

impl Default for TrainingConfig {
  fn default() -> Self {
    Self {
      dataset_size: 50_000,
      batch_size: 50,
      steps: 500,
      learning_rate: 0.042,
      report_every: 5,
      seed: None,
    }
  }
}

impl TrainingConfig {
  pub fn validate(&self) -> Result<()> {
    if self.dataset_size == 0 {
      return Err(Error::invalid("dataset_size must be positive"));
    }
    if self.batch_size == 0 {
      return Err(Error::invalid("batch_size must be positive"));
    }
    if self.batch_size > self.dataset_size {
      return Err(Error::invalid(format!(
        "batch_size {} exceeds dataset_size {}",
        self.batch_size, self.dataset_size
      )));
    }
    if self.report_every == 0 {
      return Err(Error::invalid("report_every must be positive"));
    }
    if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
      return Err(Error::invalid(format!(
        "learning_rate must be a positive number, got {}",
        self.learning_rate
      )));
    }
    Ok(())
  }

  // The fields are public, so the helpers below also run on configs that never
  // went through `validate` and must not divide by zero.

  pub fn batches_per_step(&self) -> usize {
    self.dataset_size / self.batch_size.max(1)
  }

  pub fn is_reporting_step(&self, step: usize) -> bool {
    self.report_every != 0 && step % self.report_every == 0
  }
}
