use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ensemble not initialized: {0}")]
    NotInitialized(String),

    #[error("Numeric error: {0}")]
    Numeric(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(what: &str, expected: usize, actual: usize) -> Self {
        Error::ShapeMismatch(format!("{}: expected {}, got {}", what, expected, actual))
    }

    /// Shape and configuration errors cannot be recovered from by retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ShapeMismatch(_) | Error::Configuration(_))
    }
}
