//! Command-line flags

use crate::config::RobotConfig;
use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "urobot")]
#[command(about = "Camera-steered robot that learns online which way to go", long_about = None)]
#[command(version)]
pub struct Args {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Capture device, e.g. /dev/video0
    #[arg(long, short)]
    pub device: Option<String>,

    /// Use the built-in synthetic camera instead of a real device
    #[arg(long)]
    pub simulate: bool,

    /// Stop after this many training steps
    #[arg(long)]
    pub frames: Option<u64>,

    /// Seed for weight initialisation and projections
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Speak commands aloud (on/off)
    #[arg(long, value_parser = clap::builder::BoolishValueParser::new())]
    pub speech: Option<bool>,
}

impl Args {
    /// Builds the effective configuration: defaults, file, environment, then flags.
    pub fn load_config(&self) -> Result<RobotConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RobotConfig::from_file(path)?,
            None => match RobotConfig::default_path().filter(|p| p.exists()) {
                Some(path) => RobotConfig::from_file(path)?,
                None => RobotConfig::default(),
            },
        };
        config.apply_env()?;
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut RobotConfig) {
        if let Some(ref device) = self.device {
            config.vision.device = device.clone();
        }
        if let Some(seed) = self.seed {
            config.trainer.seed = seed;
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.to_lowercase();
        }
        if let Some(speech) = self.speech {
            config.speech.enabled = speech;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "urobot",
            "--simulate",
            "--frames",
            "50",
            "--seed",
            "9",
            "--speech",
            "off",
            "--device",
            "/dev/video3",
        ])
        .unwrap();
        assert!(args.simulate);
        assert_eq!(args.frames, Some(50));

        let mut config = RobotConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.trainer.seed, 9);
        assert!(!config.speech.enabled);
        assert_eq!(config.vision.device, "/dev/video3");
    }

    #[test]
    fn test_flags_default_to_config() {
        let args = Args::try_parse_from(["urobot"]).unwrap();
        let mut config = RobotConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config, RobotConfig::default());
    }
}
