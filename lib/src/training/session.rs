//! The step loop: one step is a full pass over the dataset in fixed-size
//! batches, with the cost only materialized on reporting steps.

use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{learning_rate, CancelToken, ExponentialAverage, TrainingConfig};
use crate::{
  dataset::Dataset,
  error::{Error, Result},
  model::ComplementNet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Stepping { step: usize },
  Reporting { step: usize },
  /// Terminal: every configured step ran.
  Done { steps: usize },
  /// Terminal: the cancel token was observed before `step` started.
  Cancelled { step: usize },
  /// Terminal: `step` returned an error. The model may hold a partial update.
  Failed { step: usize },
}

impl Phase {
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      Phase::Done { .. } | Phase::Cancelled { .. } | Phase::Failed { .. }
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepReport {
  pub step: usize,
  pub learning_rate: f32,
  /// Mean of the batch costs of this step.
  pub cost: f32,
  pub smoothed_cost: f32,
  pub batches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingSummary {
  pub steps_completed: usize,
  pub last_cost: Option<f32>,
  pub cancelled: bool,
}

/// Receives the model after every reporting step.
pub trait TrainingObserver {
  fn on_report(&mut self, report: &StepReport, model: &ComplementNet);
}

impl<F> TrainingObserver for F
where
  F: FnMut(&StepReport, &ComplementNet),
{
  fn on_report(&mut self, report: &StepReport, model: &ComplementNet) {
    self(report, model)
  }
}

/// A training session. Owns the model and the dataset; nothing else mutates
/// the parameters.
#[derive(Debug)]
pub struct Trainer {
  config: TrainingConfig,
  model: ComplementNet,
  dataset: Dataset,
  step: usize,
  phase: Phase,
  smoothed_cost: ExponentialAverage,
  last_cost: Option<f32>,
}

impl Trainer {
  /// Generates the dataset and initializes the model from `config.seed`.
  pub fn new(config: TrainingConfig) -> Result<Self> {
    config.validate()?;
    let mut rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    let dataset = Dataset::generate(config.dataset_size, &mut rng)?;
    let model = ComplementNet::new(&mut rng)?;
    Self::from_parts(config, model, dataset)
  }

  /// A session over an existing model and dataset. The dataset's own length
  /// takes precedence over `config.dataset_size`.
  pub fn from_parts(config: TrainingConfig, model: ComplementNet, dataset: Dataset) -> Result<Self> {
    config.validate()?;
    if dataset.len() < config.batch_size {
      return Err(Error::invalid(format!(
        "batch_size {} exceeds dataset length {}",
        config.batch_size,
        dataset.len()
      )));
    }
    let phase = if config.steps == 0 {
      Phase::Done { steps: 0 }
    } else {
      Phase::Idle
    };
    Ok(Self {
      config,
      model,
      dataset,
      step: 0,
      phase,
      smoothed_cost: ExponentialAverage::default(),
      last_cost: None,
    })
  }

  pub fn config(&self) -> &TrainingConfig {
    &self.config
  }

  pub fn model(&self) -> &ComplementNet {
    &self.model
  }

  pub fn into_model(self) -> ComplementNet {
    self.model
  }

  pub fn dataset(&self) -> &Dataset {
    &self.dataset
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn steps_completed(&self) -> usize {
    self.step
  }

  pub fn summary(&self) -> TrainingSummary {
    TrainingSummary {
      steps_completed: self.step,
      last_cost: self.last_cost,
      cancelled: matches!(self.phase, Phase::Cancelled { .. }),
    }
  }

  /// Runs one step. Returns a report on reporting steps, `None` otherwise.
  ///
  /// Any error ends the session in [`Phase::Failed`].
  pub fn step(&mut self) -> Result<Option<StepReport>> {
    if self.phase.is_terminal() {
      return Err(Error::Finished);
    }
    let step = self.step;
    self.phase = Phase::Stepping { step };
    let result = self.advance(step);
    if let Err(err) = &result {
      warn!(step, %err, "training step failed");
      self.phase = Phase::Failed { step };
    }
    result
  }

  fn advance(&mut self, step: usize) -> Result<Option<StepReport>> {
    let rate = learning_rate(self.config.learning_rate, step);
    let fetch_cost = self.config.is_reporting_step(step);

    let mut total_cost = 0.0f32;
    let mut batches = 0usize;
    for batch in self.dataset.batches(self.config.batch_size)? {
      if let Some(cost) = self.model.train_step(batch, rate, fetch_cost)? {
        total_cost += cost;
      }
      batches += 1;
    }
    let cost = fetch_cost.then(|| total_cost / batches as f32);
    if !self.model.is_finite() || cost.is_some_and(|c| !c.is_finite()) {
      return Err(Error::NumericInstability { step });
    }
    self.step += 1;

    let report = if let Some(cost) = cost {
      let smoothed_cost = self.smoothed_cost.update(cost);
      self.last_cost = Some(cost);
      self.phase = Phase::Reporting { step };
      info!(step, cost, smoothed_cost, learning_rate = rate, "training cost");
      Some(StepReport {
        step,
        learning_rate: rate,
        cost,
        smoothed_cost,
        batches,
      })
    } else {
      debug!(step, learning_rate = rate, batches, "step done");
      None
    };

    if self.step >= self.config.steps {
      self.phase = Phase::Done { steps: self.step };
    }
    Ok(report)
  }

  /// Steps until done or cancelled, handing control back to the scheduler
  /// after every step and calling `observer` on reporting steps.
  #[instrument(skip_all)]
  pub async fn run<O>(&mut self, observer: &mut O, cancel: &CancelToken) -> Result<TrainingSummary>
  where
    O: TrainingObserver + ?Sized,
  {
    while !self.phase.is_terminal() {
      if cancel.is_cancelled() {
        warn!(step = self.step, "training cancelled");
        self.phase = Phase::Cancelled { step: self.step };
        break;
      }
      if let Some(report) = self.step()? {
        observer.on_report(&report, &self.model);
      }
      tokio::task::yield_now().await;
    }
    let summary = self.summary();
    info!(
      steps = summary.steps_completed,
      cancelled = summary.cancelled,
      "training finished"
    );
    Ok(summary)
  }
}

#[cfg(test)]
mod tests {
  use ndarray::{array, Array1, Array2};

  use super::*;
  use crate::{
    model::{Activation, Layer},
    utils::init_logging_tests,
  };

  fn small(steps: usize, report_every: usize) -> TrainingConfig {
    TrainingConfig {
      dataset_size: 120,
      batch_size: 50,
      steps,
      learning_rate: 0.042,
      report_every,
      seed: Some(1),
    }
  }

  #[tokio::test]
  async fn reports_only_on_every_nth_step() {
    let _scope = init_logging_tests();
    let mut trainer = Trainer::new(small(10, 5)).unwrap();
    assert_eq!(trainer.phase(), Phase::Idle);

    let mut seen = Vec::new();
    let mut observer = |report: &StepReport, _: &ComplementNet| seen.push(*report);
    let summary = trainer.run(&mut observer, &CancelToken::new()).await.unwrap();

    assert_eq!(seen.iter().map(|r| r.step).collect::<Vec<_>>(), vec![0, 5]);
    assert!(seen.iter().all(|r| r.batches == 2));
    assert_eq!(summary.steps_completed, 10);
    assert!(!summary.cancelled);
    assert_eq!(summary.last_cost, Some(seen[1].cost));
    assert_eq!(trainer.phase(), Phase::Done { steps: 10 });
  }

  #[test]
  fn stepping_after_done_is_an_error() {
    let mut trainer = Trainer::new(small(1, 1)).unwrap();
    assert!(trainer.step().unwrap().is_some());
    assert_eq!(trainer.phase(), Phase::Done { steps: 1 });
    assert!(matches!(trainer.step(), Err(Error::Finished)));
  }

  #[test]
  fn non_reporting_steps_return_nothing() {
    let mut trainer = Trainer::new(small(3, 2)).unwrap();
    let step0 = trainer.step().unwrap().unwrap();
    assert_eq!(step0.learning_rate, 0.042);
    assert_eq!(trainer.phase(), Phase::Reporting { step: 0 });
    assert!(trainer.step().unwrap().is_none());
    assert_eq!(trainer.phase(), Phase::Stepping { step: 1 });
    assert!(trainer.step().unwrap().is_some());
  }

  #[tokio::test]
  async fn cancelled_before_start_runs_nothing() {
    let mut trainer = Trainer::new(small(10, 5)).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut observer = |_: &StepReport, _: &ComplementNet| panic!("no report expected");
    let summary = trainer.run(&mut observer, &cancel).await.unwrap();
    assert_eq!(summary.steps_completed, 0);
    assert!(summary.cancelled);
    assert_eq!(trainer.phase(), Phase::Cancelled { step: 0 });
    assert!(matches!(trainer.step(), Err(Error::Finished)));
  }

  #[tokio::test]
  async fn cancellation_is_observed_between_steps() {
    let mut trainer = Trainer::new(small(10, 1)).unwrap();
    let cancel = CancelToken::new();
    let from_observer = cancel.clone();
    let mut observer = move |_: &StepReport, _: &ComplementNet| from_observer.cancel();
    let summary = trainer.run(&mut observer, &cancel).await.unwrap();
    assert_eq!(summary.steps_completed, 1);
    assert!(summary.cancelled);
  }

  #[tokio::test]
  async fn cost_goes_down_over_training() {
    let config = TrainingConfig {
      dataset_size: 500,
      batch_size: 50,
      steps: 60,
      learning_rate: 0.042,
      report_every: 1,
      seed: Some(11),
    };
    let mut trainer = Trainer::new(config).unwrap();
    let mut costs = Vec::new();
    let mut observer = |report: &StepReport, _: &ComplementNet| costs.push(report.cost);
    trainer.run(&mut observer, &CancelToken::new()).await.unwrap();

    assert_eq!(costs.len(), 60);
    let window = |c: &[f32]| c.iter().sum::<f32>() / c.len() as f32;
    let first = window(&costs[..5]);
    let last = window(&costs[costs.len() - 5..]);
    assert!(last < first, "first {first}, last {last}");
  }

  #[test]
  fn invalid_configs_are_rejected_up_front() {
    let config = TrainingConfig {
      batch_size: 0,
      ..small(1, 1)
    };
    assert!(matches!(
      Trainer::new(config),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn dataset_must_hold_a_full_batch() {
    let mut rng = StdRng::seed_from_u64(2);
    let dataset = Dataset::generate(20, &mut rng).unwrap();
    let model = ComplementNet::new(&mut rng).unwrap();
    assert!(matches!(
      Trainer::from_parts(small(1, 1), model, dataset),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn non_finite_parameters_fail_the_step() {
    let mut rng = StdRng::seed_from_u64(2);
    let dataset = Dataset::generate(120, &mut rng).unwrap();
    let hidden = Layer::from_parts(
      Array2::from_elem((3, 4), 0.5),
      array![f32::NAN, 0.0, 0.0, 0.0],
      Activation::Relu,
    )
    .unwrap();
    let output = Layer::from_parts(
      Array2::from_elem((4, 3), 0.5),
      Array1::zeros(3),
      Activation::ClampedRelu,
    )
    .unwrap();
    let model = ComplementNet::from_layers(vec![hidden, output]).unwrap();
    let mut trainer = Trainer::from_parts(small(3, 1), model, dataset).unwrap();
    assert!(matches!(
      trainer.step(),
      Err(Error::NumericInstability { step: 0 })
    ));
    assert_eq!(trainer.phase(), Phase::Failed { step: 0 });
    assert!(trainer.phase().is_terminal());
    assert_eq!(trainer.steps_completed(), 0);
    assert!(matches!(trainer.step(), Err(Error::Finished)));
  }

  #[tokio::test]
  async fn run_stops_on_a_failed_step() {
    let mut rng = StdRng::seed_from_u64(3);
    let dataset = Dataset::generate(120, &mut rng).unwrap();
    let output = Layer::from_parts(
      Array2::from_elem((3, 3), f32::INFINITY),
      Array1::zeros(3),
      Activation::ClampedRelu,
    )
    .unwrap();
    let model = ComplementNet::from_layers(vec![output]).unwrap();
    let mut trainer = Trainer::from_parts(small(5, 1), model, dataset).unwrap();
    let mut observer = |_: &StepReport, _: &ComplementNet| panic!("no report expected");
    let result = trainer.run(&mut observer, &CancelToken::new()).await;
    assert!(matches!(result, Err(Error::NumericInstability { step: 0 })));
    assert_eq!(trainer.phase(), Phase::Failed { step: 0 });
  }
}
