/// Multiplier applied to the rate once per [`DECAY_INTERVAL`] steps.
pub const DECAY_FACTOR: f32 = 0.85;
pub const DECAY_INTERVAL: usize = 42;

/// Step-decayed learning rate: `base * 0.85^floor(step / 42)`.
///
/// A pure function of the step counter, so a session never carries optimizer
/// state between steps.
pub fn learning_rate(base: f32, step: usize) -> f32 {
  let decays = (step / DECAY_INTERVAL).min(i32::MAX as usize) as i32;
  base * DECAY_FACTOR.powi(decays)
}
