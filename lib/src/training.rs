pub mod average;
pub mod cancel;
pub mod config;
pub mod schedule;
pub mod session;

pub use average::ExponentialAverage;
pub use cancel::CancelToken;
pub use config::TrainingConfig;
pub use schedule::learning_rate;
pub use session::{Phase, StepReport, Trainer, TrainingObserver, TrainingSummary};
