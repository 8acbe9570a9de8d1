//! urobot-spk: spoken motion commands
//!
//! Provides:
//! - A bounded announcement queue that never drops or reorders commands
//! - A playback activity draining the queue into a TTS engine
//! - Native (espeak-ng / say) and logging engines

pub mod config;
pub mod dispatcher;
pub mod engines;
pub mod error;

pub use config::{EngineKind, SpeechConfig, VoiceConfig};
pub use dispatcher::{spawn_playback, CommandDispatcher, PlaybackStats};
pub use engines::{create_engine, LoggingEngine, NativeTtsEngine, TtsEngine};
pub use error::SpeechError;
