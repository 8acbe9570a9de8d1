//! Configuration for the online trainer

use serde::{Deserialize, Serialize};

/// Adaptive-moment optimizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Exponential decay rate for the first-moment estimates
    pub beta1: f64,
    /// Exponential decay rate for the second-moment estimates
    pub beta2: f64,
    pub learning_rate: f64,
    pub epsilon: f64,
    /// Gradients are rescaled when their global L2 norm exceeds this value
    pub clip_norm: f64,
    /// The step counter used for bias correction stops here
    pub step_ceiling: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            beta1: 0.8,
            beta2: 0.89,
            learning_rate: 0.01,
            epsilon: 1e-8,
            clip_norm: 1.0,
            step_ceiling: 1000,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
            return Err("Moment decay rates must be in [0, 1)".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("Learning rate must be positive".to_string());
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err("Epsilon must be positive".to_string());
        }
        if !self.clip_norm.is_finite() || self.clip_norm <= 0.0 {
            return Err("Clip norm must be positive".to_string());
        }
        if self.step_ceiling == 0 {
            return Err("Step ceiling must be non-zero".to_string());
        }
        Ok(())
    }
}

/// Online trainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Perturbed copies of the measurement per training step
    pub batch_size: usize,
    /// Number of estimators, one per command
    pub ensemble_size: usize,
    /// Standard deviation of off-diagonal projection entries
    pub projection_stddev: f64,
    /// Seed for weight initialisation and projections
    pub seed: u64,
    pub optimizer: OptimizerConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            ensemble_size: 3,
            projection_stddev: 0.1,
            seed: 1,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("Batch size must be non-zero".to_string());
        }
        if self.ensemble_size == 0 || self.ensemble_size > crate::Command::ALL.len() {
            return Err(format!(
                "Ensemble size must be between 1 and {}",
                crate::Command::ALL.len()
            ));
        }
        if !self.projection_stddev.is_finite() || self.projection_stddev < 0.0 {
            return Err("Projection stddev must be finite and non-negative".to_string());
        }
        self.optimizer.validate()
    }
}
