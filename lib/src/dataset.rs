//! Synthetic (color, complement) training pairs.

use ndarray::{aview1, s, Array2, ArrayView2};
use rand::Rng;
use tracing::instrument;

use crate::{
  color::Rgb,
  error::{Error, Result},
};

pub const CHANNELS: usize = 3;

/// One training pair, both sides normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSample {
  pub input: [f32; CHANNELS],
  pub target: [f32; CHANNELS],
}

impl ColorSample {
  pub fn from_rgb(rgb: Rgb) -> Self {
    Self {
      input: rgb.normalized(),
      target: rgb.complement().normalized(),
    }
  }
}

/// Fixed-size, immutable set of samples stored row-wise so batches are plain
/// views into it.
#[derive(Debug, Clone)]
pub struct Dataset {
  inputs: Array2<f32>,
  targets: Array2<f32>,
}

impl Dataset {
  /// Draws `count` uniformly random colors and pairs each with its complement.
  ///
  /// The complement is computed on the integer color, then normalized.
  #[instrument(level = "debug", skip(rng))]
  pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Result<Self> {
    if count == 0 {
      return Err(Error::invalid("dataset size must be positive"));
    }
    let samples: Vec<ColorSample> = (0..count)
      .map(|_| ColorSample::from_rgb(Rgb::from(rng.gen::<[u8; CHANNELS]>())))
      .collect();
    Self::from_samples(&samples)
  }

  /// Every component of every sample must be a normalized value in `[0, 1]`.
  pub fn from_samples(samples: &[ColorSample]) -> Result<Self> {
    if samples.is_empty() {
      return Err(Error::invalid("dataset size must be positive"));
    }
    let out_of_range = samples
      .iter()
      .position(|sample| {
        !sample
          .input
          .iter()
          .chain(&sample.target)
          .all(|v| (0.0..=1.0).contains(v))
      });
    if let Some(index) = out_of_range {
      return Err(Error::invalid(format!(
        "sample {index} has a component outside [0, 1]"
      )));
    }
    let mut inputs = Array2::zeros((samples.len(), CHANNELS));
    let mut targets = Array2::zeros((samples.len(), CHANNELS));
    for (i, sample) in samples.iter().enumerate() {
      inputs.row_mut(i).assign(&aview1(&sample.input));
      targets.row_mut(i).assign(&aview1(&sample.target));
    }
    Ok(Self { inputs, targets })
  }

  pub fn len(&self) -> usize {
    self.inputs.nrows()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get(&self, index: usize) -> Option<ColorSample> {
    if index >= self.len() {
      return None;
    }
    let input = self.inputs.row(index);
    let target = self.targets.row(index);
    Some(ColorSample {
      input: [input[0], input[1], input[2]],
      target: [target[0], target[1], target[2]],
    })
  }

  pub fn iter(&self) -> impl Iterator<Item = ColorSample> + '_ {
    (0..self.len()).filter_map(move |i| self.get(i))
  }

  pub fn inputs(&self) -> ArrayView2<'_, f32> {
    self.inputs.view()
  }

  pub fn targets(&self) -> ArrayView2<'_, f32> {
    self.targets.view()
  }

  /// Contiguous, non-overlapping batches in dataset order.
  ///
  /// A trailing partial batch is dropped: with 120 samples and a batch size
  /// of 50 only `[0, 50)` and `[50, 100)` are produced.
  pub fn batches(&self, batch_size: usize) -> Result<Batches<'_>> {
    if batch_size == 0 {
      return Err(Error::invalid("batch size must be positive"));
    }
    Ok(Batches {
      dataset: self,
      batch_size,
      next: 0,
    })
  }
}

/// Borrowed rows of inputs and their matching targets.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
  pub inputs: ArrayView2<'a, f32>,
  pub targets: ArrayView2<'a, f32>,
}

impl<'a> Batch<'a> {
  pub fn new(inputs: ArrayView2<'a, f32>, targets: ArrayView2<'a, f32>) -> Self {
    Self { inputs, targets }
  }

  pub fn len(&self) -> usize {
    self.inputs.nrows()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

pub struct Batches<'a> {
  dataset: &'a Dataset,
  batch_size: usize,
  next: usize,
}

impl<'a> Iterator for Batches<'a> {
  type Item = Batch<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    let start = self.next;
    let end = start + self.batch_size;
    if end > self.dataset.len() {
      return None;
    }
    self.next = end;
    Some(Batch::new(
      self.dataset.inputs.slice(s![start..end, ..]),
      self.dataset.targets.slice(s![start..end, ..]),
    ))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = (self.dataset.len() - self.next) / self.batch_size;
    (remaining, Some(remaining))
  }
}

impl ExactSizeIterator for Batches<'_> {}
