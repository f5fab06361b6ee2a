//! BRIVAS Video SDK
//!
//! Encoder adaptation for video streams: bandwidth based quality scaling
//! driven by per-resolution bitrate limits.

pub mod bitrate_limits;
pub mod codec;
pub mod config;
pub mod error;
pub mod quality_scaler;
pub mod rate_statistics;

pub use bitrate_limits::ResolutionBitrateLimits;
pub use codec::VideoCodec;
pub use config::ScalerConfig;
pub use error::VideoSdkError;
pub use quality_scaler::{
    BandwidthQualityScaler, BandwidthQualityScalerUsageHandler, CheckBitrateResult,
};
pub use rate_statistics::RateStatistics;
