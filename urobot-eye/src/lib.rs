//! urobot-eye: frame acquisition for urobot
//!
//! Negotiates a capture format with a camera, decodes YUYV frames, reduces them to a
//! small gray thumbnail and hands one frame at a time to the control loop.

pub mod camera;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod simulated;

#[cfg(feature = "opencv")]
pub mod opencv_device;

pub use camera::{handoff, AcquisitionStats, FrameHandoff, FrameSource, FrameThrottle, Offer};
pub use config::VisionConfig;
pub use device::{CaptureDevice, FrameSize, Negotiated, PixelFormat};
pub use error::VisionError;
pub use frame::{Frame, YCbCr422};
pub use simulated::{SimulatedDevice, SimulatedEvent};

#[cfg(feature = "opencv")]
pub use opencv_device::OpenCvDevice;
