//! Command announcements and the playback activity

use crate::config::SpeechConfig;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use urobot_core::Command;

/// Producer side of the announcement queue.
///
/// Enqueueing waits for a free slot, so announcements are never dropped or reordered.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    tx: mpsc::Sender<String>,
}

impl CommandDispatcher {
    pub fn new(queue_size: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        (Self { tx }, rx)
    }

    pub fn from_config(
        config: &SpeechConfig,
    ) -> Result<(Self, mpsc::Receiver<String>), SpeechError> {
        config.validate().map_err(SpeechError::Config)?;
        Ok(Self::new(config.queue_size))
    }

    /// Queues the spoken word for `command`.
    pub async fn announce(&self, command: Command) -> Result<(), SpeechError> {
        self.say(command.word()).await
    }

    /// Queues arbitrary text.
    pub async fn say(&self, text: impl Into<String>) -> Result<(), SpeechError> {
        let text = text.into();
        debug!("Queueing announcement {:?}", text);
        self.tx
            .send(text)
            .await
            .map_err(|_| SpeechError::QueueClosed)
    }

    /// Announcements waiting for playback
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Counters reported when playback ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub spoken: u64,
    pub failed: u64,
}

/// Plays queued announcements one at a time until every dispatcher is dropped.
///
/// A failing engine is logged and playback moves on to the next announcement.
pub fn spawn_playback(
    mut queue: mpsc::Receiver<String>,
    engine: Arc<dyn TtsEngine>,
) -> JoinHandle<PlaybackStats> {
    tokio::spawn(async move {
        let mut stats = PlaybackStats::default();
        info!("Playback started with {} engine", engine.name());
        while let Some(text) = queue.recv().await {
            match engine.speak(&text).await {
                Ok(()) => stats.spoken += 1,
                Err(e) => {
                    stats.failed += 1;
                    warn!("Failed to speak {:?}: {}", text, e);
                }
            }
        }
        info!(
            "Playback finished: {} spoken, {} failed",
            stats.spoken, stats.failed
        );
        stats
    })
}
