//! Bias-corrected adaptive moment updates with global gradient-norm clipping

use crate::config::OptimizerConfig;
use crate::estimator::{Estimator, Param};
use serde::{Deserialize, Serialize};

/// Training-step counter that stops advancing at `ceiling`.
///
/// Past the ceiling the bias-correction terms stay at `1 - beta^ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounter {
    step: u32,
    ceiling: u32,
}

impl StepCounter {
    pub fn new(ceiling: u32) -> Self {
        Self { step: 0, ceiling }
    }

    /// Advances the counter (saturating) and returns the exponent for this step.
    pub fn tick(&mut self) -> u32 {
        if self.step < self.ceiling {
            self.step += 1;
        }
        self.step
    }

    pub fn current(&self) -> u32 {
        self.step
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn is_saturated(&self) -> bool {
        self.step >= self.ceiling
    }
}

/// `base^exponent`, with NaN and infinities mapped to zero.
pub fn sanitized_pow(base: f64, exponent: u32) -> f64 {
    let y = base.powf(exponent as f64);
    if y.is_finite() {
        y
    } else {
        0.0
    }
}

/// Denominators used to undo the zero-initialisation bias of the moment estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasCorrection {
    pub first: f64,
    pub second: f64,
}

impl BiasCorrection {
    pub fn at(config: &OptimizerConfig, t: u32) -> Self {
        Self {
            first: 1.0 - sanitized_pow(config.beta1, t),
            second: 1.0 - sanitized_pow(config.beta2, t),
        }
    }
}

/// Factor applied to every gradient entry so the global norm never exceeds `max_norm`.
pub fn clip_scale(norm: f64, max_norm: f64) -> f64 {
    if norm > max_norm {
        max_norm / norm
    } else {
        1.0
    }
}

/// Summary of one optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateStats {
    pub grad_norm: f64,
    pub scaling: f64,
    pub t: u32,
}

/// Updates one parameter in place from its (unscaled) gradient.
pub fn update_param(
    param: &mut Param,
    scaling: f64,
    correction: BiasCorrection,
    config: &OptimizerConfig,
) {
    let (b1, b2) = (config.beta1, config.beta2);
    for l in 0..param.values.len() {
        let g = param.grad[l] * scaling;
        let m = b1 * param.m[l] + (1.0 - b1) * g;
        let v = b2 * param.v[l] + (1.0 - b2) * g * g;
        param.m[l] = m;
        param.v[l] = v;
        let mhat = m / correction.first;
        let mut vhat = v / correction.second;
        if vhat < 0.0 {
            vhat = 0.0;
        }
        param.values[l] -= config.learning_rate * mhat / (vhat.sqrt() + config.epsilon);
    }
}

/// Clips and applies the gradients currently held by `estimator`.
pub fn step(
    estimator: &mut Estimator,
    counter: &mut StepCounter,
    config: &OptimizerConfig,
) -> UpdateStats {
    let grad_norm = estimator.grad_norm();
    let scaling = clip_scale(grad_norm, config.clip_norm);
    let t = counter.tick();
    let correction = BiasCorrection::at(config, t);
    for param in estimator.params_mut() {
        update_param(param, scaling, correction, config);
    }
    UpdateStats {
        grad_norm,
        scaling,
        t,
    }
}
