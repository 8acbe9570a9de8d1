//! Streams a few thumbnails from the simulated camera and prints their mean level

use std::sync::Arc;
use urobot_eye::{FrameSource, SimulatedDevice, VisionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Arc::new(VisionConfig {
        device: "simulated".to_string(),
        ..VisionConfig::default()
    });
    let source = FrameSource::new(config);
    let (mut rx, handle) = source.start(SimulatedDevice::new().with_frame_limit(210))?;

    while let Some(frame) = rx.recv().await {
        let m = frame.measurement();
        let mean = m.as_slice().iter().sum::<f64>() / m.len() as f64;
        let (w, h) = frame.thumb_size();
        println!("{}x{} thumbnail, mean level {:.3}", w, h, mean);
    }

    let stats = handle.await??;
    println!("{:?}", stats);
    Ok(())
}
