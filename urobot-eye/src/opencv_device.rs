//! Camera access through OpenCV's V4L2 backend
//!
//! OpenCV cannot list a device's capabilities, so formats and sizes are probed by
//! setting each candidate and reading it back.

use crate::config::VisionConfig;
use crate::device::{CaptureDevice, FrameSize, Negotiated, PixelFormat};
use crate::error::VisionError;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{
        VideoCapture, CAP_PROP_CONVERT_RGB, CAP_PROP_FOURCC, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH, CAP_PROP_READ_TIMEOUT_MSEC, CAP_V4L2,
    },
};
use std::time::Duration;
use tracing::{debug, info};

const CANDIDATE_FORMATS: [(&[u8; 4], &str); 2] =
    [(b"MJPG", "Motion-JPEG"), (b"YUYV", "YUYV 4:2:2")];

const CANDIDATE_SIZES: [(u32, u32); 5] =
    [(1280, 720), (640, 480), (352, 288), (320, 240), (160, 120)];

pub struct OpenCvDevice {
    name: String,
    capture: VideoCapture,
    streaming: bool,
}

impl OpenCvDevice {
    pub fn open(config: &VisionConfig) -> Result<Self, VisionError> {
        let index = config.device_index().ok_or_else(|| {
            VisionError::Config(format!("Cannot derive a device index from {}", config.device))
        })?;
        let capture = VideoCapture::new(index, CAP_V4L2)
            .map_err(|e| VisionError::Camera(format!("Failed to open {}: {}", config.device, e)))?;
        if !capture.is_opened()? {
            return Err(VisionError::Camera(format!("{} failed to open", config.device)));
        }
        info!("Opened {} through OpenCV", config.device);
        Ok(Self {
            name: config.device.clone(),
            capture,
            streaming: false,
        })
    }

    fn set_fourcc(&mut self, fourcc: u32) -> Result<bool, VisionError> {
        self.capture.set(CAP_PROP_FOURCC, f64::from(fourcc))?;
        Ok(self.capture.get(CAP_PROP_FOURCC)? as u32 == fourcc)
    }

    fn set_size(&mut self, size: FrameSize) -> Result<bool, VisionError> {
        self.capture.set(CAP_PROP_FRAME_WIDTH, f64::from(size.width))?;
        self.capture.set(CAP_PROP_FRAME_HEIGHT, f64::from(size.height))?;
        let width = self.capture.get(CAP_PROP_FRAME_WIDTH)? as u32;
        let height = self.capture.get(CAP_PROP_FRAME_HEIGHT)? as u32;
        Ok(width == size.width && height == size.height)
    }
}

impl CaptureDevice for OpenCvDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_formats(&mut self) -> Result<Vec<PixelFormat>, VisionError> {
        let mut formats = Vec::new();
        for (code, description) in CANDIDATE_FORMATS {
            let format = PixelFormat::new(code, description);
            if self.set_fourcc(format.fourcc)? {
                formats.push(format);
            } else {
                debug!("{} rejected {}", self.name, format);
            }
        }
        Ok(formats)
    }

    fn supported_frame_sizes(
        &mut self,
        format: &PixelFormat,
    ) -> Result<Vec<FrameSize>, VisionError> {
        self.set_fourcc(format.fourcc)?;
        let mut sizes = Vec::new();
        for (width, height) in CANDIDATE_SIZES {
            let size = FrameSize::new(width, height);
            if self.set_size(size)? {
                sizes.push(size);
            }
        }
        Ok(sizes)
    }

    fn negotiate(
        &mut self,
        format: &PixelFormat,
        size: FrameSize,
    ) -> Result<Negotiated, VisionError> {
        self.set_fourcc(format.fourcc)?;
        self.set_size(size)?;
        // Raw YUYV bytes instead of BGR
        self.capture.set(CAP_PROP_CONVERT_RGB, 0.0)?;

        let fourcc = self.capture.get(CAP_PROP_FOURCC)? as u32;
        let actual = FrameSize::new(
            self.capture.get(CAP_PROP_FRAME_WIDTH)? as u32,
            self.capture.get(CAP_PROP_FRAME_HEIGHT)? as u32,
        );
        let format = if fourcc == format.fourcc {
            format.clone()
        } else {
            let bytes = fourcc.to_le_bytes();
            PixelFormat::new(&bytes, "device default")
        };
        Ok(Negotiated {
            format,
            size: actual,
        })
    }

    fn start_streaming(&mut self) -> Result<(), VisionError> {
        self.streaming = true;
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), VisionError> {
        self.streaming = false;
        self.capture.release()?;
        Ok(())
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), VisionError> {
        if !self.streaming {
            return Err(VisionError::Camera("device is not streaming".to_string()));
        }
        self.capture
            .set(CAP_PROP_READ_TIMEOUT_MSEC, timeout.as_millis() as f64)?;
        if self.capture.grab()? {
            Ok(())
        } else {
            Err(VisionError::failed_wait(&self.name, self.capture.is_opened()?))
        }
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, VisionError> {
        let mut mat = Mat::default();
        if !self.capture.retrieve(&mut mat, 0)? || mat.empty() {
            return Err(VisionError::BadFrame("empty frame".to_string()));
        }
        Ok(mat.data_bytes()?.to_vec())
    }
}
