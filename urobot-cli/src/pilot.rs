//! Control loop: frame in, command out

use crate::error::PilotError;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use urobot_core::{Command, StepReport, Trainer};
use urobot_eye::Frame;
use urobot_spk::CommandDispatcher;

/// What the control loop did before it stopped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PilotSummary {
    pub steps: u64,
    /// Commands issued, indexed like `Command::ALL`
    pub commands: [u64; 3],
    pub skipped: u64,
    pub last: Option<StepReport>,
}

impl PilotSummary {
    pub fn count(&self, command: Command) -> u64 {
        self.commands[command.index()]
    }
}

/// Trains on every received frame and announces the selected command.
///
/// Runs until the frame stream closes or `max_steps` steps have been taken. Fatal
/// trainer errors end the loop; others skip the frame.
pub async fn run_pilot(
    frames: &mut mpsc::Receiver<Frame>,
    trainer: &mut Trainer,
    dispatcher: &CommandDispatcher,
    max_steps: Option<u64>,
) -> Result<PilotSummary, PilotError> {
    let mut summary = PilotSummary::default();

    while max_steps.map_or(true, |max| summary.steps < max) {
        let frame = match frames.recv().await {
            Some(frame) => frame,
            None => {
                info!("Frame stream closed");
                break;
            }
        };
        let measurement = frame.measurement();

        let report = match trainer.step(measurement.as_slice()) {
            Ok(report) => report,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                summary.skipped += 1;
                warn!("Skipping frame: {}", e);
                continue;
            }
        };

        debug!(
            "Step {}: {} (variances {:?}, loss {:.6})",
            summary.steps, report.command, report.variances, report.loss
        );
        dispatcher.announce(report.command).await?;

        summary.steps += 1;
        summary.commands[report.command.index()] += 1;
        summary.last = Some(report);
    }

    info!(
        "Pilot stopped after {} steps (left {}, right {}, straight {})",
        summary.steps,
        summary.count(Command::Left),
        summary.count(Command::Right),
        summary.count(Command::Straight)
    );
    Ok(summary)
}
