//! urobot-cli: wires the camera, the trainer and the speaker together

pub mod args;
pub mod config;
pub mod error;
pub mod pilot;

pub use args::Args;
pub use config::RobotConfig;
pub use error::{ConfigError, PilotError};
pub use pilot::{run_pilot, PilotSummary};
