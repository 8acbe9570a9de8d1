//! Error types for urobot-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// Unrecoverable device failure (open, negotiation, streaming, capture)
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Timed out waiting for frame: {0}")]
    Timeout(String),

    #[error("Bad frame: {0}")]
    BadFrame(String),

    #[error("Capture stream ended")]
    StreamEnded,

    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),
}

impl VisionError {
    /// Timeouts and single bad frames are logged and skipped; everything else ends capture.
    pub fn is_transient(&self) -> bool {
        matches!(self, VisionError::Timeout(_) | VisionError::BadFrame(_))
    }

    /// Error for a wait that produced no frame: a timeout while the device is still
    /// open, a camera failure once it has gone away.
    pub fn failed_wait(device: &str, still_open: bool) -> Self {
        if still_open {
            VisionError::Timeout(device.to_string())
        } else {
            VisionError::Camera(format!("{} is no longer open", device))
        }
    }
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}
