//! Configuration for urobot-eye

use serde::{Deserialize, Serialize};

/// Frame source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Capture device, e.g. `/dev/video0`
    pub device: String,
    /// Deliver one out of this many captured frames
    pub frame_interval: u32,
    /// Integer factor between the captured frame and the thumbnail
    pub downsample: u32,
    /// Seconds to wait for a frame before logging a timeout and retrying
    pub wait_timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            frame_interval: 21,
            downsample: 16,
            wait_timeout_secs: 5,
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.device.is_empty() {
            return Err("Device must not be empty".to_string());
        }
        if self.device.len() > 256 || self.device.contains('\0') {
            return Err("Device name is invalid".to_string());
        }
        if self.frame_interval == 0 {
            return Err("Frame interval must be non-zero".to_string());
        }
        if self.downsample == 0 || self.downsample > 256 {
            return Err("Downsample factor must be between 1 and 256".to_string());
        }
        if self.wait_timeout_secs == 0 || self.wait_timeout_secs > 3600 {
            return Err("Wait timeout must be between 1 and 3600 seconds".to_string());
        }
        Ok(())
    }

    /// Numeric index of the device (`/dev/video2` -> 2, `3` -> 3).
    pub fn device_index(&self) -> Option<i32> {
        let digits: String = self
            .device
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisionConfig::default();
        assert_eq!(config.device, "/dev/video0");
        assert_eq!(config.frame_interval, 21);
        assert_eq!(config.downsample, 16);
        assert_eq!(config.wait_timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_device() {
        let mut config = VisionConfig::default();
        config.device = String::new();
        assert!(config.validate().is_err());

        config.device = "cam\0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_interval_and_downsample() {
        let mut config = VisionConfig::default();
        config.frame_interval = 0;
        assert!(config.validate().is_err());

        let mut config = VisionConfig::default();
        config.downsample = 0;
        assert!(config.validate().is_err());
        config.downsample = 257;
        assert!(config.validate().is_err());
        config.downsample = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_timeout() {
        let mut config = VisionConfig::default();
        config.wait_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.wait_timeout_secs = 3601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_device_index() {
        let mut config = VisionConfig::default();
        assert_eq!(config.device_index(), Some(0));
        config.device = "/dev/video12".to_string();
        assert_eq!(config.device_index(), Some(12));
        config.device = "3".to_string();
        assert_eq!(config.device_index(), Some(3));
        config.device = "usb-camera".to_string();
        assert_eq!(config.device_index(), None);
    }
}
