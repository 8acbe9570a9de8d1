//! Normalised grayscale measurements

use serde::{Deserialize, Serialize};

/// Flattened grayscale thumbnail with intensities scaled into `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    values: Vec<f64>,
}

impl Measurement {
    /// Scales 8-bit gray levels by 1/256.
    pub fn from_gray(pixels: &[u8]) -> Self {
        Self {
            values: pixels.iter().map(|p| f64::from(*p) / 256.0).collect(),
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AsRef<[f64]> for Measurement {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}
