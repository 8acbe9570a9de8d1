//! Capture device capability API and format negotiation

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Pixel format as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelFormat {
    /// Little-endian FOURCC code
    pub fourcc: u32,
    pub description: String,
}

impl PixelFormat {
    pub fn new(code: &[u8; 4], description: &str) -> Self {
        Self {
            fourcc: u32::from_le_bytes(*code),
            description: description.to_string(),
        }
    }

    pub fn yuyv() -> Self {
        Self::new(b"YUYV", "YUYV 4:2:2")
    }

    pub fn mjpeg() -> Self {
        Self::new(b"MJPG", "Motion-JPEG")
    }

    pub fn code(&self) -> String {
        self.fourcc
            .to_le_bytes()
            .iter()
            .map(|b| *b as char)
            .collect()
    }

    pub fn is_yuyv(&self) -> bool {
        self.fourcc == u32::from_le_bytes(*b"YUYV")
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Format and size the device actually accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiated {
    pub format: PixelFormat,
    pub size: FrameSize,
}

/// Blocking interface to a capture device.
///
/// Only the acquisition activity calls into a device, so implementations need `Send`
/// but not `Sync`.
pub trait CaptureDevice: Send {
    fn name(&self) -> &str;

    /// Pixel formats in the device's native enumeration order
    fn supported_formats(&mut self) -> Result<Vec<PixelFormat>, VisionError>;

    fn supported_frame_sizes(&mut self, format: &PixelFormat)
        -> Result<Vec<FrameSize>, VisionError>;

    fn negotiate(&mut self, format: &PixelFormat, size: FrameSize)
        -> Result<Negotiated, VisionError>;

    fn start_streaming(&mut self) -> Result<(), VisionError>;

    fn stop_streaming(&mut self) -> Result<(), VisionError>;

    /// Blocks until a frame is ready, failing with `VisionError::Timeout` after `timeout`.
    fn wait_for_frame(&mut self, timeout: Duration) -> Result<(), VisionError>;

    /// Raw bytes of the frame signalled by the last successful wait.
    fn read_frame(&mut self) -> Result<Vec<u8>, VisionError>;
}

/// Picks the second distinct format in enumeration order.
///
/// A device with a single format gets that format.
pub fn select_format(formats: &[PixelFormat]) -> Result<PixelFormat, VisionError> {
    let mut distinct: Vec<&PixelFormat> = Vec::with_capacity(formats.len());
    for f in formats {
        if !distinct.iter().any(|d| d.fourcc == f.fourcc) {
            distinct.push(f);
        }
    }
    match distinct.len() {
        0 => Err(VisionError::Format(
            "device reports no pixel formats".to_string(),
        )),
        1 => {
            warn!("Only one pixel format available, using {}", distinct[0]);
            Ok(distinct[0].clone())
        }
        _ => Ok(distinct[1].clone()),
    }
}

/// Picks the smallest frame size by pixel count; the first enumerated wins ties.
pub fn select_frame_size(sizes: &[FrameSize]) -> Result<FrameSize, VisionError> {
    let mut best: Option<FrameSize> = None;
    for size in sizes {
        if size.pixels() == 0 {
            continue;
        }
        match best {
            Some(b) if b.pixels() <= size.pixels() => {}
            _ => best = Some(*size),
        }
    }
    best.ok_or_else(|| VisionError::Format("device reports no frame sizes".to_string()))
}

/// Enumerates the device, selects a format and size, and negotiates them.
pub fn negotiate(device: &mut dyn CaptureDevice) -> Result<Negotiated, VisionError> {
    let formats = device.supported_formats()?;
    info!("Available formats on {}:", device.name());
    for (i, f) in formats.iter().enumerate() {
        info!("[{}] {}", i + 1, f);
    }
    let format = select_format(&formats)?;

    let sizes = device.supported_frame_sizes(&format)?;
    info!("Supported frame sizes for format {}:", format);
    for (i, s) in sizes.iter().enumerate() {
        info!("[{}] {}", i + 1, s);
    }
    let size = select_frame_size(&sizes)?;

    let negotiated = device.negotiate(&format, size)?;
    info!(
        "Resulting image format: {} ({})",
        negotiated.format, negotiated.size
    );
    if !negotiated.format.is_yuyv() {
        warn!(
            "Negotiated {} but frames are decoded as YUYV 4:2:2",
            negotiated.format
        );
    }
    Ok(negotiated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_second_distinct_format() {
        let formats = vec![PixelFormat::mjpeg(), PixelFormat::yuyv()];
        assert_eq!(select_format(&formats).unwrap(), PixelFormat::yuyv());

        // Duplicates are skipped before counting
        let formats = vec![
            PixelFormat::mjpeg(),
            PixelFormat::mjpeg(),
            PixelFormat::yuyv(),
            PixelFormat::new(b"UYVY", "UYVY 4:2:2"),
        ];
        assert_eq!(select_format(&formats).unwrap(), PixelFormat::yuyv());
    }

    #[test]
    fn test_select_format_fallbacks() {
        assert_eq!(
            select_format(&[PixelFormat::yuyv()]).unwrap(),
            PixelFormat::yuyv()
        );
        assert!(matches!(select_format(&[]), Err(VisionError::Format(_))));
    }

    #[test]
    fn test_select_smallest_frame_size() {
        let sizes = vec![
            FrameSize::new(640, 480),
            FrameSize::new(320, 240),
            FrameSize::new(1280, 720),
        ];
        assert_eq!(select_frame_size(&sizes).unwrap(), FrameSize::new(320, 240));
    }

    #[test]
    fn test_select_frame_size_tie_keeps_first() {
        let sizes = vec![
            FrameSize::new(640, 480),
            FrameSize::new(480, 640),
            FrameSize::new(800, 600),
        ];
        assert_eq!(select_frame_size(&sizes).unwrap(), FrameSize::new(640, 480));
    }

    #[test]
    fn test_select_frame_size_empty() {
        assert!(select_frame_size(&[]).is_err());
        assert!(select_frame_size(&[FrameSize::new(0, 480)]).is_err());
    }

    #[test]
    fn test_pixel_format_code() {
        assert_eq!(PixelFormat::yuyv().code(), "YUYV");
        assert!(PixelFormat::yuyv().is_yuyv());
        assert!(!PixelFormat::mjpeg().is_yuyv());
        assert_eq!(PixelFormat::mjpeg().to_string(), "Motion-JPEG (MJPG)");
    }
}
