//! Color rows shown next to the model while it trains: the original color, its
//! analytic complement and the model's prediction.

use serde::{Deserialize, Serialize};

use crate::{color::Rgb, error::Result, model::ComplementNet};

/// Rows shown when no palette is configured.
pub const DEFAULT_PALETTE: [&str; 10] = [
  "255,0,0",
  "0,255,0",
  "0,0,255",
  "10,200,30",
  "240,200,30",
  "133,30,200",
  "30,140,180",
  "250,128,114",
  "64,64,64",
  "200,200,200",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SwatchRow {
  pub original: Rgb,
  pub analytic: Rgb,
  pub predicted: Rgb,
}

impl SwatchRow {
  /// Mean absolute channel distance between prediction and analytic complement.
  pub fn error(&self) -> f32 {
    let a = self.analytic.channels();
    let p = self.predicted.channels();
    a.iter()
      .zip(p.iter())
      .map(|(&a, &p)| (a as f32 - p as f32).abs())
      .sum::<f32>()
      / 3.0
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Palette {
  colors: Vec<Rgb>,
}

impl Palette {
  pub fn new(colors: Vec<Rgb>) -> Self {
    Self { colors }
  }

  /// Parses `"r,g,b"` rows.
  pub fn parse<I, S>(rows: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let colors = rows
      .into_iter()
      .map(|row| row.as_ref().parse::<Rgb>())
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Self { colors })
  }

  pub fn colors(&self) -> &[Rgb] {
    &self.colors
  }

  pub fn is_empty(&self) -> bool {
    self.colors.is_empty()
  }

  pub fn rows(&self, model: &ComplementNet) -> Vec<SwatchRow> {
    self
      .colors
      .iter()
      .map(|&original| SwatchRow {
        original,
        analytic: original.complement(),
        predicted: model.predict_rgb(original),
      })
      .collect()
  }
}
