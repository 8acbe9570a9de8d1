//! Error types for urobot-cli

use thiserror::Error;
use urobot_spk::SpeechError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Reasons the control loop stops early.
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Trainer error: {0}")]
    Trainer(#[from] urobot_core::Error),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),
}
