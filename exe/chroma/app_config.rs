use std::{error::Error, fs, path::Path, path::PathBuf};

use chroma::{palette::DEFAULT_PALETTE, Palette, TrainingConfig};
use serde::Deserialize;

/// Options from the YAML config file and the command line. Also defines the
/// config file format (every field can be omitted).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
  pub dataset_size: Option<usize>,
  pub batch_size: Option<usize>,
  pub steps: Option<usize>,
  pub learning_rate: Option<f32>,
  /// Compute and print the cost on every n-th step
  pub report_every: Option<usize>,
  pub seed: Option<u64>,
  /// Colors to visualise, as "r,g,b" strings
  pub palette: Option<Vec<String>>,
  /// Where to write the final JSON report
  pub report_out: Option<PathBuf>,
}

impl AppConfig {
  pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
  }

  // merge configs where the second overwrites the first
  pub fn merge(self, other: Self) -> Self {
    Self {
      dataset_size: other.dataset_size.or(self.dataset_size),
      batch_size: other.batch_size.or(self.batch_size),
      steps: other.steps.or(self.steps),
      learning_rate: other.learning_rate.or(self.learning_rate),
      report_every: other.report_every.or(self.report_every),
      seed: other.seed.or(self.seed),
      palette: other.palette.or(self.palette),
      report_out: other.report_out.or(self.report_out),
    }
  }

  pub fn training_config(&self) -> TrainingConfig {
    let defaults = TrainingConfig::default();
    TrainingConfig {
      dataset_size: self.dataset_size.unwrap_or(defaults.dataset_size),
      batch_size: self.batch_size.unwrap_or(defaults.batch_size),
      steps: self.steps.unwrap_or(defaults.steps),
      learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
      report_every: self.report_every.unwrap_or(defaults.report_every),
      seed: self.seed.or(defaults.seed),
    }
  }

  pub fn palette(&self) -> chroma::Result<Palette> {
    match &self.palette {
      Some(rows) => Palette::parse(rows),
      None => Palette::parse(DEFAULT_PALETTE),
    }
  }
}
