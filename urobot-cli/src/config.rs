//! Layered robot configuration
//!
//! Defaults, then an optional config file (JSON, TOML or YAML), then `UROBOT_*`
//! environment variables, then command-line flags.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use urobot_core::TrainerConfig;
use urobot_eye::VisionConfig;
use urobot_spk::SpeechConfig;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub vision: VisionConfig,
    pub speech: SpeechConfig,
    pub trainer: TrainerConfig,
    /// error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            vision: VisionConfig::default(),
            speech: SpeechConfig::default(),
            trainer: TrainerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl RobotConfig {
    /// Per-user config file, e.g. `~/.config/urobot/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("urobot").join("config.toml"))
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from string, trying JSON, TOML and YAML in turn
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let json_err = match serde_json::from_str::<RobotConfig>(content) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };

        let toml_err = match toml::from_str::<RobotConfig>(content) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };

        let yaml_err = match serde_yaml::from_str::<RobotConfig>(content) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };

        Err(ConfigError::Parse(format!(
            "not valid JSON ({}), TOML ({}) or YAML ({})",
            json_err,
            toml_err.message(),
            yaml_err
        )))
    }

    /// Apply `UROBOT_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply variables from `lookup`; unparsable values are rejected.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(device) = lookup("UROBOT_DEVICE") {
            self.vision.device = device;
        }

        if let Some(seed) = lookup("UROBOT_SEED") {
            self.trainer.seed = seed
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("UROBOT_SEED={} is not a seed", seed)))?;
        }

        if let Some(level) = lookup("UROBOT_LOG_LEVEL") {
            self.log_level = level.trim().to_lowercase();
        }

        if let Some(speech) = lookup("UROBOT_SPEECH") {
            self.speech.enabled = parse_switch(&speech).ok_or_else(|| {
                ConfigError::Parse(format!("UROBOT_SPEECH={} is not on/off", speech))
            })?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vision
            .validate()
            .map_err(|e| ConfigError::Validation(format!("vision: {}", e)))?;
        self.speech
            .validate()
            .map_err(|e| ConfigError::Validation(format!("speech: {}", e)))?;
        self.trainer
            .validate()
            .map_err(|e| ConfigError::Validation(format!("trainer: {}", e)))?;
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "log_level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level.as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
