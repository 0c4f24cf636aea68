//! Trains a small ReLU network to predict the HSL complement of an RGB color.
//!
//! - [`color`]: the closed-form complement the network learns.
//! - [`dataset`]: random colors paired with their complements.
//! - [`model`]: the 3 -> 64 -> 32 -> 16 -> 3 regression network.
//! - [`training`]: learning-rate schedule and the step loop.
//! - [`palette`]: rows of (original, analytic, predicted) colors for display.

pub mod color;
pub mod dataset;
pub mod error;
pub mod model;
pub mod palette;
pub mod training;
pub mod utils;

pub use color::{complement, Rgb};
pub use dataset::{Batch, ColorSample, Dataset};
pub use error::{Error, Result};
pub use model::ComplementNet;
pub use palette::{Palette, SwatchRow};
pub use training::{
  learning_rate, CancelToken, Phase, StepReport, Trainer, TrainingConfig, TrainingObserver,
  TrainingSummary,
};
