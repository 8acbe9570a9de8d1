// urobot - watch, learn, pick a direction, say it

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use urobot_cli::{run_pilot, Args, RobotConfig};
use urobot_core::Trainer;
use urobot_eye::{AcquisitionStats, Frame, FrameSource, SimulatedDevice, VisionError};
use urobot_spk::{create_engine, spawn_playback, CommandDispatcher};

type Acquisition = (
    mpsc::Receiver<Frame>,
    JoinHandle<Result<AcquisitionStats, VisionError>>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_target(false)
        .with_thread_ids(false)
        .init();

    info!("Starting urobot (seed {})", config.trainer.seed);

    let mut trainer = Trainer::new(config.trainer.clone())?;

    let engine = create_engine(&config.speech);
    let (dispatcher, queue) = CommandDispatcher::from_config(&config.speech)?;
    let playback = spawn_playback(queue, engine);
    dispatcher.say("starting").await?;

    let source = FrameSource::new(Arc::new(config.vision.clone()));
    let (mut frames, acquisition) = if args.simulate {
        info!("Using simulated camera");
        let device = SimulatedDevice::new().with_frame_delay(Duration::from_millis(33));
        source.start(device)?
    } else {
        start_camera(&source, &config)?
    };

    let pilot = run_pilot(&mut frames, &mut trainer, &dispatcher, args.frames).await;

    source.stop();
    drop(frames);
    let acquired = acquisition.await.context("Acquisition task failed")?;
    drop(dispatcher);
    let played = playback.await.context("Playback task failed")?;

    let summary = pilot?;
    let stats = acquired.context("Frame acquisition failed")?;
    info!(
        "Done: {} steps, {} frames captured, {} delivered, {} announcements spoken",
        summary.steps, stats.captured, stats.delivered, played.spoken
    );
    Ok(())
}

#[cfg(feature = "opencv")]
fn start_camera(source: &FrameSource, config: &RobotConfig) -> anyhow::Result<Acquisition> {
    let device = urobot_eye::OpenCvDevice::open(&config.vision)?;
    Ok(source.start(device)?)
}

#[cfg(not(feature = "opencv"))]
fn start_camera(_source: &FrameSource, config: &RobotConfig) -> anyhow::Result<Acquisition> {
    anyhow::bail!(
        "cannot open {}: built without camera support (enable the `opencv` feature or pass --simulate)",
        config.vision.device
    )
}
