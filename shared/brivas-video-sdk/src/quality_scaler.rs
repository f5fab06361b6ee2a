//! Bandwidth based quality scaler
//!
//! Watches the encoded bitrate of a video stream and asks for a smaller or
//! larger resolution when the bitrate leaves the band configured for the
//! current frame size. Used when the encoder's QP values are not reliable
//! enough to drive scaling (hardware encoders, mostly).

use crate::bitrate_limits::{
    default_limits_when_qp_is_untrusted, limit_for_resolution, ResolutionBitrateLimits,
};
use crate::codec::VideoCodec;
use crate::config::ScalerConfig;
use crate::rate_statistics::{RateStatistics, BPS_SCALE};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Receives the scaler's adaptation requests. Called from the scaler's
/// background task.
pub trait BandwidthQualityScalerUsageHandler: Send + Sync {
    /// Bitrate is well below what the resolution needs: scale up
    fn on_report_usage_bandwidth_high(&self);
    /// Bitrate is above what the resolution needs: scale down
    fn on_report_usage_bandwidth_low(&self);
}

/// Outcome of a single bitrate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckBitrateResult {
    /// Bitrate below the band, a larger resolution is affordable
    HighBitRate,
    /// Bitrate above the band, the resolution should shrink
    LowBitRate,
    NormalBitrate,
    InsufficientSamples,
}

struct ScalerState {
    encoded_bitrate: RateStatistics,
    last_time_sent_in_ms: Option<i64>,
    last_frame_size_pixels: Option<u32>,
    resolution_bitrate_limits: Vec<ResolutionBitrateLimits>,
    higher_max_bitrate_toleration_factor: f64,
    lower_min_bitrate_toleration_factor: f64,
}

impl ScalerState {
    fn check_bitrate(&mut self) -> CheckBitrateResult {
        let (Some(pixels), Some(now_ms)) = (self.last_frame_size_pixels, self.last_time_sent_in_ms)
        else {
            return CheckBitrateResult::InsufficientSamples;
        };

        let Some(bitrate_bps) = self.encoded_bitrate.rate(now_ms) else {
            return CheckBitrateResult::InsufficientSamples;
        };
        let Some(limit) = limit_for_resolution(Some(pixels), &self.resolution_bitrate_limits)
        else {
            return CheckBitrateResult::InsufficientSamples;
        };

        // Tolerances keep the result from flapping around the band edges
        let bitrate_bps = bitrate_bps as f64;
        if bitrate_bps
            > f64::from(limit.max_bitrate_bps) * self.higher_max_bitrate_toleration_factor
        {
            CheckBitrateResult::LowBitRate
        } else if bitrate_bps
            < f64::from(limit.min_start_bitrate_bps) * self.lower_min_bitrate_toleration_factor
        {
            CheckBitrateResult::HighBitRate
        } else {
            CheckBitrateResult::NormalBitrate
        }
    }
}

/// Periodically compares the encoded bitrate against per-resolution limits.
///
/// Must be created inside a Tokio runtime: construction spawns the recurring
/// check, which holds only a weak reference and ends once the scaler is
/// dropped. After an adaptation request the last resolution is forgotten,
/// so the next request needs frames at the new resolution.
pub struct BandwidthQualityScaler {
    state: Arc<Mutex<ScalerState>>,
}

impl BandwidthQualityScaler {
    pub fn new(handler: Arc<dyn BandwidthQualityScalerUsageHandler>) -> Self {
        Self::with_config(handler, ScalerConfig::default())
    }

    pub fn with_config(
        handler: Arc<dyn BandwidthQualityScalerUsageHandler>,
        config: ScalerConfig,
    ) -> Self {
        let state = Arc::new(Mutex::new(ScalerState {
            encoded_bitrate: RateStatistics::new(config.max_window_size_ms, BPS_SCALE),
            last_time_sent_in_ms: None,
            last_frame_size_pixels: None,
            resolution_bitrate_limits: Vec::new(),
            higher_max_bitrate_toleration_factor: config.higher_max_bitrate_toleration_factor,
            lower_min_bitrate_toleration_factor: config.lower_min_bitrate_toleration_factor,
        }));

        tokio::spawn(run_bitrate_checks(
            Arc::downgrade(&state),
            handler,
            config.bitrate_state_update_interval(),
        ));

        Self { state }
    }

    /// Record an encoded frame
    pub fn report_encode_info(
        &self,
        frame_size_bytes: usize,
        time_sent_in_ms: i64,
        encoded_width: u32,
        encoded_height: u32,
    ) {
        let mut state = self.state.lock();
        state.last_time_sent_in_ms = Some(time_sent_in_ms);
        state.last_frame_size_pixels = Some(encoded_width.saturating_mul(encoded_height));
        let bytes = i64::try_from(frame_size_bytes).unwrap_or(i64::MAX);
        state.encoded_bitrate.update(bytes, time_sent_in_ms);
    }

    /// Replace the limits table. An empty table selects the defaults for `codec`.
    pub fn set_resolution_bitrate_limits(
        &self,
        limits: &[ResolutionBitrateLimits],
        codec: VideoCodec,
    ) {
        let limits = if limits.is_empty() {
            debug!(%codec, "Using default bitrate limits");
            default_limits_when_qp_is_untrusted(codec)
        } else {
            limits.to_vec()
        };
        self.state.lock().resolution_bitrate_limits = limits;
    }

    /// Classify the current bitrate without acting on it
    pub fn check_bitrate(&self) -> CheckBitrateResult {
        self.state.lock().check_bitrate()
    }
}

async fn run_bitrate_checks(
    state: Weak<Mutex<ScalerState>>,
    handler: Arc<dyn BandwidthQualityScalerUsageHandler>,
    interval: Duration,
) {
    loop {
        tokio::time::sleep(interval).await;

        let Some(state) = state.upgrade() else {
            trace!("Quality scaler dropped, stopping bitrate checks");
            return;
        };
        let result = {
            let mut state = state.lock();
            let result = state.check_bitrate();
            if matches!(
                result,
                CheckBitrateResult::HighBitRate | CheckBitrateResult::LowBitRate
            ) {
                state.last_frame_size_pixels = None;
            }
            result
        };
        drop(state);

        match result {
            CheckBitrateResult::HighBitRate => {
                debug!("Encoded bitrate below limits, requesting higher resolution");
                handler.on_report_usage_bandwidth_high();
            }
            CheckBitrateResult::LowBitRate => {
                debug!("Encoded bitrate above limits, requesting lower resolution");
                handler.on_report_usage_bandwidth_low();
            }
            CheckBitrateResult::NormalBitrate | CheckBitrateResult::InsufficientSamples => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 360;

    #[derive(Default)]
    struct CountingHandler {
        high: AtomicUsize,
        low: AtomicUsize,
    }

    impl CountingHandler {
        fn counts(&self) -> (usize, usize) {
            (self.high.load(Ordering::SeqCst), self.low.load(Ordering::SeqCst))
        }
    }

    impl BandwidthQualityScalerUsageHandler for CountingHandler {
        fn on_report_usage_bandwidth_high(&self) {
            self.high.fetch_add(1, Ordering::SeqCst);
        }

        fn on_report_usage_bandwidth_low(&self) {
            self.low.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scaler() -> (Arc<CountingHandler>, BandwidthQualityScaler) {
        let handler = Arc::new(CountingHandler::default());
        let scaler = BandwidthQualityScaler::new(handler.clone());
        scaler.set_resolution_bitrate_limits(&[], VideoCodec::H264);
        (handler, scaler)
    }

    /// One frame every 10 ms for five seconds, roughly 800 bps per byte
    fn report_frames(scaler: &BandwidthQualityScaler, frame_size_bytes: usize) {
        for i in 0..500 {
            scaler.report_encode_info(frame_size_bytes, i * 10, WIDTH, HEIGHT);
        }
    }

    async fn wait_for_check() {
        tokio::time::sleep(Duration::from_millis(5001)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_samples() {
        let handler = Arc::new(CountingHandler::default());
        let scaler = BandwidthQualityScaler::new(handler.clone());
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::InsufficientSamples);

        // A single frame gives no rate
        scaler.report_encode_info(1000, 0, WIDTH, HEIGHT);
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::InsufficientSamples);

        // No limits configured yet
        report_frames(&scaler, 1250);
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::InsufficientSamples);

        scaler.set_resolution_bitrate_limits(&[], VideoCodec::H264);
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::LowBitRate);

        wait_for_check().await;
        assert_eq!(handler.counts(), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_bitrate() {
        let (handler, scaler) = scaler();
        // ~600 kbps, inside [0.8 * 500 kbps, 0.95 * 800 kbps]
        report_frames(&scaler, 750);
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::NormalBitrate);

        wait_for_check().await;
        wait_for_check().await;
        assert_eq!(handler.counts(), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_high_bitrate_requests_lower_resolution_once() {
        let (handler, scaler) = scaler();
        // ~1 Mbps, above 0.95 * 800 kbps
        report_frames(&scaler, 1250);

        wait_for_check().await;
        assert_eq!(handler.counts(), (0, 1));

        // Resolution was reset, so no further requests without new frames
        wait_for_check().await;
        assert_eq!(handler.counts(), (0, 1));
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::InsufficientSamples);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_bitrate_requests_higher_resolution_once() {
        let (handler, scaler) = scaler();
        // ~200 kbps, below 0.8 * 500 kbps
        report_frames(&scaler, 250);

        wait_for_check().await;
        wait_for_check().await;
        assert_eq!(handler.counts(), (1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_limits() {
        let (handler, scaler) = scaler();
        scaler.set_resolution_bitrate_limits(
            &[ResolutionBitrateLimits::new(WIDTH * HEIGHT, 100_000, 30_000, 2_000_000)],
            VideoCodec::H264,
        );
        report_frames(&scaler, 1250);
        assert_eq!(scaler.check_bitrate(), CheckBitrateResult::NormalBitrate);

        wait_for_check().await;
        assert_eq!(handler.counts(), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_scaler_stops_checking() {
        let (handler, scaler) = scaler();
        report_frames(&scaler, 1250);
        drop(scaler);

        wait_for_check().await;
        assert_eq!(handler.counts(), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_interval_from_config() {
        let handler = Arc::new(CountingHandler::default());
        let config = ScalerConfig {
            bitrate_state_update_interval_ms: 1000,
            ..ScalerConfig::default()
        };
        let scaler = BandwidthQualityScaler::with_config(handler.clone(), config);
        scaler.set_resolution_bitrate_limits(&[], VideoCodec::H264);
        report_frames(&scaler, 250);

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(handler.counts(), (1, 0));
    }
}
