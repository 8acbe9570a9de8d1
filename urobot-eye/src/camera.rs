//! Frame acquisition and hand-off

use crate::config::VisionConfig;
use crate::device::{self, CaptureDevice};
use crate::error::VisionError;
use crate::frame::Frame;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Admits the first frame and then every `interval`-th one.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: u32,
    counter: u32,
}

impl FrameThrottle {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            counter: 0,
        }
    }

    pub fn admit(&mut self) -> bool {
        let admitted = self.counter == 0;
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
        }
        admitted
    }
}

/// Outcome of offering a frame to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Delivered,
    /// A frame was already pending; the new one was discarded
    Dropped,
    /// The consumer is gone
    Closed,
}

/// Producer side of the single-slot frame queue. Offering never blocks.
#[derive(Debug, Clone)]
pub struct FrameHandoff {
    tx: mpsc::Sender<Frame>,
}

/// Creates a hand-off holding at most one pending frame.
pub fn handoff() -> (FrameHandoff, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(1);
    (FrameHandoff { tx }, rx)
}

impl FrameHandoff {
    pub fn offer(&self, frame: Frame) -> Offer {
        match self.tx.try_send(frame) {
            Ok(()) => Offer::Delivered,
            Err(TrySendError::Full(_)) => Offer::Dropped,
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Counters reported when acquisition ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub captured: u64,
    pub skipped: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub timeouts: u64,
    pub bad_frames: u64,
}

/// Runs the blocking acquisition loop until the stream ends, the consumer goes away
/// or `is_running` is cleared.
///
/// Negotiation and streaming failures are returned. Timeouts and bad frames are
/// logged and the loop carries on.
pub fn run_acquisition(
    device: &mut dyn CaptureDevice,
    config: &VisionConfig,
    handoff: &FrameHandoff,
    is_running: &RwLock<bool>,
) -> Result<AcquisitionStats, VisionError> {
    config.validate().map_err(VisionError::Config)?;
    let negotiated = device::negotiate(device)?;
    let size = negotiated.size;
    device.start_streaming()?;
    info!("Streaming from {} at {}", device.name(), size);

    let timeout = Duration::from_secs(config.wait_timeout_secs);
    let mut throttle = FrameThrottle::new(config.frame_interval);
    let mut stats = AcquisitionStats::default();

    let outcome = loop {
        if !*is_running.read() {
            debug!("Acquisition stop requested");
            break Ok(());
        }

        match device.wait_for_frame(timeout) {
            Ok(()) => {}
            Err(VisionError::StreamEnded) => {
                info!("Capture stream ended");
                break Ok(());
            }
            Err(VisionError::Timeout(_)) => {
                stats.timeouts += 1;
                warn!("Timed out after {}s waiting for frame", config.wait_timeout_secs);
                continue;
            }
            Err(e) if e.is_transient() => {
                stats.bad_frames += 1;
                warn!("Skipping frame: {}", e);
                continue;
            }
            Err(e) => break Err(e),
        }

        let raw = match device.read_frame() {
            Ok(raw) => raw,
            Err(e) if e.is_transient() => {
                stats.bad_frames += 1;
                warn!("Failed to read frame: {}", e);
                continue;
            }
            Err(e) => break Err(e),
        };
        stats.captured += 1;

        if !throttle.admit() {
            stats.skipped += 1;
            continue;
        }

        let frame = match Frame::from_yuyv(&raw, size.width, size.height, config.downsample) {
            Ok(frame) => frame,
            Err(e) if e.is_transient() => {
                stats.bad_frames += 1;
                warn!("Discarding undecodable frame: {}", e);
                continue;
            }
            Err(e) => break Err(e),
        };

        match handoff.offer(frame) {
            Offer::Delivered => stats.delivered += 1,
            Offer::Dropped => {
                stats.dropped += 1;
                debug!("Consumer busy, frame dropped");
            }
            Offer::Closed => {
                info!("Frame consumer closed, stopping acquisition");
                break Ok(());
            }
        }
    };

    if let Err(e) = device.stop_streaming() {
        warn!("Failed to stop streaming: {}", e);
    }

    match outcome {
        Ok(()) => {
            info!(
                "Acquisition finished: {} captured, {} delivered, {} dropped",
                stats.captured, stats.delivered, stats.dropped
            );
            Ok(stats)
        }
        Err(e) => {
            error!("Acquisition failed: {}", e);
            Err(e)
        }
    }
}

/// Owns the acquisition activity for one device.
pub struct FrameSource {
    config: Arc<VisionConfig>,
    is_running: Arc<RwLock<bool>>,
}

impl FrameSource {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self {
            config,
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// Starts acquisition on a blocking worker and returns the frame receiver.
    pub fn start<D>(
        &self,
        mut device: D,
    ) -> Result<
        (
            mpsc::Receiver<Frame>,
            JoinHandle<Result<AcquisitionStats, VisionError>>,
        ),
        VisionError,
    >
    where
        D: CaptureDevice + 'static,
    {
        {
            let mut is_running = self.is_running.write();
            if *is_running {
                return Err(VisionError::Camera("Frame source already running".to_string()));
            }
            *is_running = true;
        }

        let (tx, rx) = handoff();
        let config = self.config.clone();
        let is_running = self.is_running.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let result = run_acquisition(&mut device, &config, &tx, &is_running);
            *is_running.write() = false;
            result
        });

        info!("Frame source started on {}", self.config.device);
        Ok((rx, handle))
    }

    /// Asks the acquisition loop to stop after the current wait.
    pub fn stop(&self) {
        *self.is_running.write() = false;
        info!("Frame source stop requested");
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
