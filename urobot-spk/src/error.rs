//! Error types for urobot-spk

use thiserror::Error;

/// Speech errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Announcement queue closed")]
    QueueClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] urobot_core::Error),
}

impl From<SpeechError> for urobot_core::Error {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Core(inner) => inner,
            other => urobot_core::Error::Configuration(format!("Speech error: {}", other)),
        }
    }
}
