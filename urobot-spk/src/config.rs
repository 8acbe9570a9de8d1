//! Configuration for command announcements

use serde::{Deserialize, Serialize};

/// Speech configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak announcements aloud; when off they are only logged
    pub enabled: bool,

    /// Preferred engine
    pub engine: EngineKind,

    /// Voice settings
    pub voice: VoiceConfig,

    /// Speech rate (words per minute, 0-500, default 150)
    pub rate: u32,

    /// Volume (0.0-1.0, default 0.8)
    pub volume: f32,

    /// Pitch adjustment (-1.0 to 1.0, default 0.0)
    pub pitch: f32,

    /// Announcements that may wait for playback before `announce` suspends
    pub queue_size: usize,
}

/// Announcement sink
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// espeak-ng on Linux, `say` on macOS
    Native,
    /// Write announcements to the log only
    Logging,
}

/// Voice configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Voice name/identifier
    pub name: Option<String>,

    /// Language code (e.g., "en-US", "es-ES")
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: EngineKind::Native,
            voice: VoiceConfig::default(),
            rate: 150,
            volume: 0.8,
            pitch: 0.0,
            queue_size: 8,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: None,
            language: "en-US".to_string(),
        }
    }
}

impl VoiceConfig {
    /// Validate voice configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.language.is_empty() {
            return Err("Language code cannot be empty".to_string());
        }

        if self.language.len() > 32 {
            return Err("Language code too long (max 32 chars)".to_string());
        }

        // "en-US" or "en"
        if !self
            .language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(
                "Language code contains invalid characters (only alphanumeric and '-' allowed)"
                    .to_string(),
            );
        }

        if let Some(ref name) = self.name {
            if name.is_empty() {
                return Err("Voice name cannot be empty if provided".to_string());
            }

            if name.len() > 256 {
                return Err("Voice name too long (max 256 chars)".to_string());
            }

            if name.chars().any(|c| c == '\0' || c.is_control()) {
                return Err("Voice name contains invalid characters".to_string());
            }
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rate > 500 {
            return Err("Speech rate must be between 0 and 500 WPM".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("Volume must be between 0.0 and 1.0".to_string());
        }

        if !(-1.0..=1.0).contains(&self.pitch) {
            return Err("Pitch must be between -1.0 and 1.0".to_string());
        }

        if self.queue_size == 0 {
            return Err("Queue size must be greater than 0".to_string());
        }

        if self.queue_size > 10000 {
            return Err("Queue size too large (max 10000)".to_string());
        }

        self.voice.validate()?;

        Ok(())
    }
}
