use crate::inputs::EmissionLevel;
use thiserror::Error;

/// Empirical quantiles of the training-time emission index distribution.
pub const DEFAULT_LOW_THRESHOLD: f64 = 0.15073993760975574;
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.36767003665036824;

#[derive(Debug, Error, PartialEq)]
#[error("invalid level thresholds: low = {low}, medium = {medium} (need finite low < medium)")]
pub struct InvalidThresholds {
    pub low: f64,
    pub medium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    low: f64,
    medium: f64,
}

impl LevelThresholds {
    pub fn new(low: f64, medium: f64) -> Result<Self, InvalidThresholds> {
        if !low.is_finite() || !medium.is_finite() || low >= medium {
            return Err(InvalidThresholds { low, medium });
        }
        Ok(Self { low, medium })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn medium(&self) -> f64 {
        self.medium
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

/// Buckets an emission index. Lower bounds are inclusive; defined for every
/// input, including values outside `[0, 1]`.
pub fn classify_level(index: f64, thresholds: &LevelThresholds) -> EmissionLevel {
    if index < thresholds.low {
        EmissionLevel::Low
    } else if index < thresholds.medium {
        EmissionLevel::Medium
    } else {
        EmissionLevel::High
    }
}

impl EmissionLevel {
    /// Classification under the default thresholds.
    pub fn from_index(index: f64) -> Self {
        classify_level(index, &LevelThresholds::default())
    }
}
