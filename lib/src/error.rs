use crate::color::ParseColorError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Batch or layer dimensions disagree. Aborts the current step.
  #[error("shape mismatch in {context}: expected {expected}, found {found}")]
  ShapeMismatch {
    context: &'static str,
    expected: usize,
    found: usize,
  },

  /// Rejected before training starts (zero sizes, empty batches, bad rates).
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// NaN or Inf showed up in the cost or in the parameters after `step`.
  #[error("numeric instability detected at step {step}")]
  NumericInstability { step: usize },

  #[error("training session already finished")]
  Finished,

  #[error(transparent)]
  ParseColor(#[from] ParseColorError),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn invalid(msg: impl Into<String>) -> Self {
    Error::InvalidArgument(msg.into())
  }
}
