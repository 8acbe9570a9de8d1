//! Synthetic capture device
//!
//! Produces a deterministic moving gradient in YUYV 4:2:2 and can be scripted to
//! time out, return bad frames or fail hard, so the acquisition loop can be exercised
//! without hardware.

use crate::device::{CaptureDevice, FrameSize, Negotiated, PixelFormat};
use crate::error::VisionError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the next `wait_for_frame` call does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedEvent {
    Frame,
    Timeout,
    /// The wait succeeds but the read fails
    BadRead,
    /// Unrecoverable device error
    Fault,
}

/// Counters observable after the device has been moved into the acquisition thread.
#[derive(Debug, Default)]
pub struct DeviceCounters {
    pub waits: AtomicU64,
    pub frames: AtomicU64,
    pub started: AtomicBool,
    pub stopped: AtomicBool,
}

impl DeviceCounters {
    pub fn waits(&self) -> u64 {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct SimulatedDevice {
    name: String,
    formats: Vec<PixelFormat>,
    sizes: Vec<FrameSize>,
    negotiated: Option<Negotiated>,
    streaming: bool,
    script: VecDeque<SimulatedEvent>,
    frame_limit: Option<u64>,
    frame_delay: Duration,
    pending: Option<SimulatedEvent>,
    counters: Arc<DeviceCounters>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            name: "simulated".to_string(),
            formats: vec![PixelFormat::mjpeg(), PixelFormat::yuyv()],
            sizes: vec![
                FrameSize::new(640, 480),
                FrameSize::new(320, 240),
                FrameSize::new(1280, 720),
            ],
            negotiated: None,
            streaming: false,
            script: VecDeque::new(),
            frame_limit: None,
            frame_delay: Duration::ZERO,
            pending: None,
            counters: Arc::new(DeviceCounters::default()),
        }
    }

    pub fn with_formats(mut self, formats: Vec<PixelFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_sizes(mut self, sizes: Vec<FrameSize>) -> Self {
        self.sizes = sizes;
        self
    }

    /// Events consumed before falling back to plain frames.
    pub fn with_script(mut self, events: impl IntoIterator<Item = SimulatedEvent>) -> Self {
        self.script = events.into_iter().collect();
        self
    }

    /// End the stream after this many frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Time each wait takes, mimicking the camera's frame period.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    pub fn counters(&self) -> Arc<DeviceCounters> {
        self.counters.clone()
    }

    fn render(&self, size: FrameSize, index: u64) -> Vec<u8> {
        let (w, h) = (size.width as usize, size.height as usize);
        let mut raw = Vec::with_capacity(w * h * 2);
        let shift = (index * 8) as usize;
        for y in 0..h {
            for x in (0..w).step_by(2) {
                let y0 = ((x * 4 + y * 2 + shift) % 256) as u8;
                let y1 = (((x + 1) * 4 + y * 2 + shift) % 256) as u8;
                raw.extend_from_slice(&[y0, 128, y1, 128]);
            }
        }
        raw
    }
}

impl CaptureDevice for SimulatedDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_formats(&mut self) -> Result<Vec<PixelFormat>, VisionError> {
        Ok(self.formats.clone())
    }

    fn supported_frame_sizes(
        &mut self,
        _format: &PixelFormat,
    ) -> Result<Vec<FrameSize>, VisionError> {
        Ok(self.sizes.clone())
    }

    fn negotiate(
        &mut self,
        format: &PixelFormat,
        size: FrameSize,
    ) -> Result<Negotiated, VisionError> {
        if !self.formats.contains(format) {
            return Err(VisionError::Camera(format!("format {} rejected", format)));
        }
        if !self.sizes.contains(&size) {
            return Err(VisionError::Camera(format!("size {} rejected", size)));
        }
        let negotiated = Negotiated {
            format: format.clone(),
            size,
        };
        self.negotiated = Some(negotiated.clone());
        Ok(negotiated)
    }

    fn start_streaming(&mut self) -> Result<(), VisionError> {
        if self.negotiated.is_none() {
            return Err(VisionError::Camera(
                "start requested before negotiation".to_string(),
            ));
        }
        self.streaming = true;
        self.counters.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_streaming(&mut self) -> Result<(), VisionError> {
        self.streaming = false;
        self.counters.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wait_for_frame(&mut self, _timeout: Duration) -> Result<(), VisionError> {
        if !self.streaming {
            return Err(VisionError::Camera("device is not streaming".to_string()));
        }
        self.counters.waits.fetch_add(1, Ordering::SeqCst);
        if !self.frame_delay.is_zero() {
            std::thread::sleep(self.frame_delay);
        }

        let event = match self.script.pop_front() {
            Some(event) => event,
            None => {
                if let Some(limit) = self.frame_limit {
                    if self.counters.frames() >= limit {
                        return Err(VisionError::StreamEnded);
                    }
                }
                SimulatedEvent::Frame
            }
        };

        match event {
            SimulatedEvent::Timeout => Err(VisionError::Timeout(self.name.clone())),
            SimulatedEvent::Fault => Err(VisionError::Camera("simulated device fault".to_string())),
            SimulatedEvent::Frame | SimulatedEvent::BadRead => {
                self.pending = Some(event);
                Ok(())
            }
        }
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, VisionError> {
        match self.pending.take() {
            Some(SimulatedEvent::Frame) => {
                let size = self
                    .negotiated
                    .as_ref()
                    .map(|n| n.size)
                    .ok_or_else(|| VisionError::Camera("device not negotiated".to_string()))?;
                let index = self.counters.frames.fetch_add(1, Ordering::SeqCst);
                Ok(self.render(size, index))
            }
            Some(SimulatedEvent::BadRead) => {
                Err(VisionError::BadFrame("simulated read failure".to_string()))
            }
            _ => Err(VisionError::BadFrame("no frame signalled".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::negotiate;

    #[test]
    fn test_default_negotiation() {
        let mut device = SimulatedDevice::new();
        let negotiated = negotiate(&mut device).unwrap();
        assert_eq!(negotiated.format, PixelFormat::yuyv());
        assert_eq!(negotiated.size, FrameSize::new(320, 240));
    }

    #[test]
    fn test_wait_requires_streaming() {
        let mut device = SimulatedDevice::new();
        assert!(matches!(
            device.wait_for_frame(Duration::from_secs(1)),
            Err(VisionError::Camera(_))
        ));
    }

    #[test]
    fn test_script_then_limit() {
        let mut device = SimulatedDevice::new()
            .with_script([SimulatedEvent::Timeout, SimulatedEvent::BadRead])
            .with_frame_limit(1);
        negotiate(&mut device).unwrap();
        device.start_streaming().unwrap();
        let timeout = Duration::from_secs(1);

        assert!(matches!(device.wait_for_frame(timeout), Err(VisionError::Timeout(_))));
        device.wait_for_frame(timeout).unwrap();
        assert!(matches!(device.read_frame(), Err(VisionError::BadFrame(_))));
        device.wait_for_frame(timeout).unwrap();
        let raw = device.read_frame().unwrap();
        assert_eq!(raw.len(), 320 * 240 * 2);
        assert!(matches!(device.wait_for_frame(timeout), Err(VisionError::StreamEnded)));
        assert_eq!(device.counters().frames(), 1);
        assert_eq!(device.counters().waits(), 4);
    }
}
