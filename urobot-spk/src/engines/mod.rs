//! Announcement sinks

pub mod logging;
pub mod native;

use crate::config::{EngineKind, SpeechConfig};
use crate::error::SpeechError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub use logging::LoggingEngine;
pub use native::NativeTtsEngine;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Speak `text`, returning once playback has finished
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Check if engine is available
    fn is_available(&self) -> bool;

    /// Get engine name
    fn name(&self) -> &str;
}

/// Builds the configured engine, falling back to logging when speech is disabled or
/// the native synthesizer is missing.
pub fn create_engine(config: &SpeechConfig) -> Arc<dyn TtsEngine> {
    if !config.enabled || config.engine == EngineKind::Logging {
        info!("Speech disabled, announcements are logged only");
        return Arc::new(LoggingEngine::new());
    }

    let native = NativeTtsEngine::from_config(config);
    if native.is_available() {
        info!("Using native TTS engine ({})", native.program());
        Arc::new(native)
    } else {
        warn!("Native TTS engine not available, announcements are logged only");
        Arc::new(LoggingEngine::new())
    }
}
