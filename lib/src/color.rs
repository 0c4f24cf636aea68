//! RGB colors at the integer boundary and the closed-form HSL complement.
//!
//! The hue arithmetic keeps the rounded radian constants of the browser demo
//! this model was first trained against (`1.0472` for a sixth of a turn,
//! `6.2832` for a full turn), so the produced integers match it for every one
//! of the 256^3 inputs.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A sixth of a turn in the rounded radians used by the hue formula.
const HUE_SEXTANT: f64 = 1.0472;
/// A full turn in the same units.
const FULL_TURN: f64 = 6.2832;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Rgb {
  pub const fn new(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  pub fn channels(self) -> [u8; 3] {
    [self.r, self.g, self.b]
  }

  /// Channels divided by 255.
  pub fn normalized(self) -> [f32; 3] {
    self.channels().map(|c| c as f32 / 255.0)
  }

  /// Inverse of [`Rgb::normalized`]: `round(x * 255)`, clamped into `[0, 255]`.
  pub fn from_normalized(values: [f32; 3]) -> Self {
    let [r, g, b] = values.map(|v| denormalize(v as f64));
    Self { r, g, b }
  }

  pub fn complement(self) -> Self {
    complement(self)
  }
}

impl From<[u8; 3]> for Rgb {
  fn from([r, g, b]: [u8; 3]) -> Self {
    Self { r, g, b }
  }
}

impl From<Rgb> for [u8; 3] {
  fn from(rgb: Rgb) -> Self {
    rgb.channels()
  }
}

impl fmt::Display for Rgb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseColorError {
  #[error("expected three comma-separated components, found {0}")]
  ComponentCount(usize),
  #[error("invalid color component {0:?}, expected an integer in 0..=255")]
  Component(String),
}

/// Parses the `"r,g,b"` triples carried by palette rows, e.g. `"10,200,30"`.
impl FromStr for Rgb {
  type Err = ParseColorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (r, g, b) = s
      .split(',')
      .map(parse_component)
      .collect_tuple()
      .ok_or_else(|| ParseColorError::ComponentCount(s.split(',').count()))?;
    Ok(Self::new(r?, g?, b?))
  }
}

fn parse_component(component: &str) -> Result<u8, ParseColorError> {
  let trimmed = component.trim();
  trimmed
    .parse::<u8>()
    .map_err(|_| ParseColorError::Component(trimmed.to_string()))
}

fn denormalize(value: f64) -> u8 {
  (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// The color on the opposite side of the hue wheel with the same saturation
/// and lightness.
///
/// Grays (`r == g == b`) have no hue and map to themselves.
pub fn complement(rgb: Rgb) -> Rgb {
  let [r, g, b] = rgb.channels().map(|c| c as f64 / 255.0);
  let max = r.max(g).max(b);
  let min = r.min(g).min(b);
  let l = (max + min) / 2.0;

  if max == min {
    let gray = denormalize(l);
    return Rgb::new(gray, gray, gray);
  }

  let d = max - min;
  let s = if l > 0.5 {
    d / (2.0 - max - min)
  } else {
    d / (max + min)
  };
  let h = if max == r && g >= b {
    HUE_SEXTANT * (g - b) / d
  } else if max == r {
    HUE_SEXTANT * (g - b) / d + FULL_TURN
  } else if max == g {
    HUE_SEXTANT * (b - r) / d + 2.0 * HUE_SEXTANT
  } else {
    HUE_SEXTANT * (r - g) / d + 4.0 * HUE_SEXTANT
  };

  // rotate half a turn, in degrees, then back to [0, 1]
  let mut degrees = h / FULL_TURN * 360.0 + 180.0;
  if degrees > 360.0 {
    degrees -= 360.0;
  }
  let h = degrees / 360.0;

  let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
  let p = 2.0 * l - q;
  Rgb::new(
    denormalize(hue_to_channel(p, q, h + 1.0 / 3.0)),
    denormalize(hue_to_channel(p, q, h)),
    denormalize(hue_to_channel(p, q, h - 1.0 / 3.0)),
  )
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
  if t < 0.0 {
    t += 1.0;
  }
  if t > 1.0 {
    t -= 1.0;
  }
  if t < 1.0 / 6.0 {
    p + (q - p) * 6.0 * t
  } else if t < 1.0 / 2.0 {
    q
  } else if t < 2.0 / 3.0 {
    p + (q - p) * (2.0 / 3.0 - t) * 6.0
  } else {
    p
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn extremes(rgb: Rgb) -> i32 {
    let c = rgb.channels();
    let max = *c.iter().max().unwrap() as i32;
    let min = *c.iter().min().unwrap() as i32;
    max + min
  }

  #[test]
  fn primaries_map_to_their_opposites() {
    assert_eq!(complement(Rgb::new(255, 0, 0)), Rgb::new(0, 255, 255));
    assert_eq!(complement(Rgb::new(0, 255, 0)), Rgb::new(255, 0, 255));
    assert_eq!(complement(Rgb::new(0, 0, 255)), Rgb::new(255, 255, 0));
  }

  #[test]
  fn each_hue_sector_lands_on_the_exact_integers() {
    // max red, g >= b
    assert_eq!(complement(Rgb::new(250, 128, 114)), Rgb::new(114, 236, 250));
    assert_eq!(complement(Rgb::new(240, 200, 30)), Rgb::new(30, 70, 240));
    // max red, g < b: shifted by a full turn, then wrapped past 360 degrees
    assert_eq!(complement(Rgb::new(200, 30, 100)), Rgb::new(30, 200, 130));
    assert_eq!(complement(Rgb::new(255, 0, 255)), Rgb::new(0, 255, 0));
    // max green
    assert_eq!(complement(Rgb::new(10, 200, 30)), Rgb::new(200, 10, 180));
    // max blue, wrapped
    assert_eq!(complement(Rgb::new(30, 100, 200)), Rgb::new(200, 130, 30));
    assert_eq!(complement(Rgb::new(133, 30, 200)), Rgb::new(97, 200, 30));
  }

  #[test]
  fn secondaries_map_to_primaries() {
    assert_eq!(complement(Rgb::new(255, 255, 0)), Rgb::new(0, 0, 255));
    // lands exactly on 360 degrees, which is not wrapped
    assert_eq!(complement(Rgb::new(0, 255, 255)), Rgb::new(255, 0, 0));
  }

  #[test]
  fn black_and_white_are_fixed_points() {
    assert_eq!(complement(Rgb::new(0, 0, 0)), Rgb::new(0, 0, 0));
    assert_eq!(complement(Rgb::new(255, 255, 255)), Rgb::new(255, 255, 255));
  }

  #[test]
  fn every_gray_is_its_own_complement() {
    for v in 0..=255u8 {
      let gray = Rgb::new(v, v, v);
      assert_eq!(complement(gray), gray, "gray {v}");
    }
  }

  #[test]
  fn lightness_survives_the_rotation_for_every_color() {
    for r in 0..=255u8 {
      for g in 0..=255u8 {
        for b in 0..=255u8 {
          let rgb = Rgb::new(r, g, b);
          let diff = (extremes(complement(rgb)) - extremes(rgb)).abs();
          assert!(diff <= 2, "{rgb:?} -> {:?}", complement(rgb));
        }
      }
    }
  }

  #[test]
  fn parses_comma_separated_triples() {
    assert_eq!("10,200,30".parse::<Rgb>(), Ok(Rgb::new(10, 200, 30)));
    assert_eq!(" 1 , 2 ,3 ".parse::<Rgb>(), Ok(Rgb::new(1, 2, 3)));
    assert_eq!(
      "10,200".parse::<Rgb>(),
      Err(ParseColorError::ComponentCount(2))
    );
    assert_eq!(
      "1,2,3,4".parse::<Rgb>(),
      Err(ParseColorError::ComponentCount(4))
    );
    assert_eq!(
      "10,256,30".parse::<Rgb>(),
      Err(ParseColorError::Component("256".into()))
    );
    assert_eq!(
      "10,x,30".parse::<Rgb>(),
      Err(ParseColorError::Component("x".into()))
    );
  }

  #[test]
  fn denormalizes_with_rounding_and_clamping() {
    assert_eq!(Rgb::from_normalized([0.5, -0.2, 1.7]), Rgb::new(128, 0, 255));
    assert_eq!(Rgb::from_normalized([0.0, 1.0, 0.2]), Rgb::new(0, 255, 51));
  }

  #[test]
  fn displays_as_hex() {
    assert_eq!(Rgb::new(10, 200, 30).to_string(), "#0ac81e");
  }

  proptest! {
    #[test]
    fn normalized_round_trips(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
      let rgb = Rgb::new(r, g, b);
      prop_assert_eq!(Rgb::from_normalized(rgb.normalized()), rgb);
    }

    #[test]
    fn chromatic_colors_stay_chromatic(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
      prop_assume!(!(r == g && g == b));
      let out = complement(Rgb::new(r, g, b));
      prop_assert!(!(out.r == out.g && out.g == out.b));
    }
  }
}
