//! urobot-core: online learning loop for a camera-steered robot
//!
//! An ensemble of small auto-encoders competes for every observation. The estimator
//! that reconstructs randomly projected copies of the observation most consistently is
//! trained on it, and its index becomes the motion command.

pub mod command;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod estimator;
pub mod matrix;
pub mod measurement;
pub mod optimizer;
pub mod projection;
pub mod trainer;

pub use command::Command;
pub use config::{OptimizerConfig, TrainerConfig};
pub use ensemble::{select_min_variance, Ensemble};
pub use error::{Error, Result};
pub use estimator::{Batch, Estimator, Forward};
pub use matrix::Matrix;
pub use measurement::Measurement;
pub use optimizer::{BiasCorrection, StepCounter};
pub use trainer::{Phase, StepReport, Trainer};
