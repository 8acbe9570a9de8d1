//! Online trainer: augment, select, update
//!
//! Every accepted measurement drives one step:
//!
//! 1. build a batch of randomly projected copies of the measurement, each targeting the
//!    unperturbed measurement;
//! 2. evaluate every estimator and select the one with the lowest reconstruction variance;
//! 3. back-propagate the selected estimator's mean loss and apply one clipped,
//!    bias-corrected adaptive update to it alone;
//! 4. report the command associated with the selected estimator.

use crate::command::Command;
use crate::config::TrainerConfig;
use crate::ensemble::{select_min_variance, Ensemble};
use crate::error::{Error, Result};
use crate::estimator::Batch;
use crate::optimizer;
use crate::projection;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lifecycle of the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No measurement seen, no ensemble allocated
    Idle,
    /// First measurement seen, ensemble just allocated
    Warm,
    /// Every later measurement
    Steady,
}

/// Outcome of one training step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub command: Command,
    pub selected: usize,
    pub variances: Vec<f64>,
    /// Mean loss of the selected estimator before its update
    pub loss: f64,
    pub grad_norm: f64,
    pub phase: Phase,
    /// Bias-correction exponent used for the update
    pub t: u32,
}

pub struct Trainer {
    config: TrainerConfig,
    rng: StdRng,
    ensemble: Ensemble,
    batch: Option<Batch>,
    phase: Phase,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;
        let rng = StdRng::seed_from_u64(config.seed);
        let ensemble = Ensemble::new(config.ensemble_size, config.optimizer.step_ceiling);
        Ok(Self {
            config,
            rng,
            ensemble,
            batch: None,
            phase: Phase::Idle,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Runs one training step on `measurement` and returns the selected command.
    pub fn step(&mut self, measurement: &[f64]) -> Result<StepReport> {
        if measurement.is_empty() {
            return Err(Error::Configuration("measurement is empty".to_string()));
        }
        let width = measurement.len();

        if self.ensemble.initialize(width, &mut self.rng)? {
            self.batch = Some(Batch::new(width, self.config.batch_size));
            self.phase = Phase::Warm;
            info!("Trainer warm: width {}", width);
        } else {
            self.phase = Phase::Steady;
        }

        let mut batch = self
            .batch
            .take()
            .ok_or_else(|| Error::NotInitialized("batch buffer missing".to_string()))?;
        let result = self.train_on(&mut batch, measurement);
        self.batch = Some(batch);
        result
    }

    fn train_on(&mut self, batch: &mut Batch, measurement: &[f64]) -> Result<StepReport> {
        let width = measurement.len();
        for slot in 0..batch.size() {
            let transform =
                projection::sample(&mut self.rng, width, self.config.projection_stddev);
            let input = projection::apply(&transform, measurement)?;
            batch.set_slot(slot, &input, measurement)?;
        }

        let variances: Vec<f64> = self
            .ensemble
            .evaluate(batch)?
            .into_iter()
            .map(|f| f.variance)
            .collect();
        let selected = select_min_variance(&variances);

        let (member, counter) = self.ensemble.member_and_counter(selected)?;
        member.reset_scratch();
        let forward = member.forward(batch)?;
        member.backward()?;
        let stats = optimizer::step(member, counter, &self.config.optimizer);

        let command = Command::from_index(selected).ok_or_else(|| {
            Error::Configuration(format!("no command for estimator {}", selected))
        })?;

        debug!(
            "step t={} selected={} ({}) loss={:.6} grad_norm={:.6} variances={:?}",
            stats.t, selected, command, forward.loss, stats.grad_norm, variances
        );

        Ok(StepReport {
            command,
            selected,
            variances,
            loss: forward.loss,
            grad_norm: stats.grad_norm,
            phase: self.phase,
            t: stats.t,
        })
    }
}
