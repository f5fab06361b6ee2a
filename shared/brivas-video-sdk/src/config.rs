//! Bandwidth quality scaler configuration

use crate::VideoSdkError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for [`BandwidthQualityScaler`](crate::BandwidthQualityScaler)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    /// Time between bitrate checks (ms)
    pub bitrate_state_update_interval_ms: u64,
    /// Window of the encoded bitrate estimate (ms)
    pub max_window_size_ms: i64,
    /// Fraction of the max bitrate above which a smaller resolution is requested
    pub higher_max_bitrate_toleration_factor: f64,
    /// Fraction of the min start bitrate below which a larger resolution is requested
    pub lower_min_bitrate_toleration_factor: f64,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            bitrate_state_update_interval_ms: 5000,
            max_window_size_ms: 5000,
            higher_max_bitrate_toleration_factor: 0.95,
            lower_min_bitrate_toleration_factor: 0.8,
        }
    }
}

impl ScalerConfig {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self, VideoSdkError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| VideoSdkError::Config(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| VideoSdkError::Config(e.to_string()))
    }

    pub fn bitrate_state_update_interval(&self) -> Duration {
        Duration::from_millis(self.bitrate_state_update_interval_ms)
    }
}
