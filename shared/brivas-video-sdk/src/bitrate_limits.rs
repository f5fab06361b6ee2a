//! Per-resolution encoder bitrate limits

use crate::codec::VideoCodec;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Floor reported for interpolated limits
pub const DEFAULT_MIN_BITRATE_BPS: u32 = 30_000;

/// Bitrate band an encoder should stay in at a given frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolutionBitrateLimits {
    pub frame_size_pixels: u32,
    pub min_start_bitrate_bps: u32,
    pub min_bitrate_bps: u32,
    pub max_bitrate_bps: u32,
}

impl ResolutionBitrateLimits {
    pub const fn new(
        frame_size_pixels: u32,
        min_start_bitrate_bps: u32,
        min_bitrate_bps: u32,
        max_bitrate_bps: u32,
    ) -> Self {
        Self {
            frame_size_pixels,
            min_start_bitrate_bps,
            min_bitrate_bps,
            max_bitrate_bps,
        }
    }
}

const H265_LIMITS_WHEN_QP_IS_UNTRUSTED: [ResolutionBitrateLimits; 7] = [
    ResolutionBitrateLimits::new(0, 0, 0, 0),
    ResolutionBitrateLimits::new(320 * 180, 0, 30_000, 150_000),
    ResolutionBitrateLimits::new(480 * 270, 150_000, 30_000, 300_000),
    ResolutionBitrateLimits::new(640 * 360, 300_000, 30_000, 420_000),
    ResolutionBitrateLimits::new(960 * 540, 420_000, 30_000, 1_000_000),
    ResolutionBitrateLimits::new(1280 * 720, 1_000_000, 30_000, 1_500_000),
    ResolutionBitrateLimits::new(1920 * 1080, 1_500_000, 30_000, 3_300_000),
];

// Tuned for H264, used for every other codec as well
const LIMITS_WHEN_QP_IS_UNTRUSTED: [ResolutionBitrateLimits; 7] = [
    ResolutionBitrateLimits::new(0, 0, 0, 0),
    ResolutionBitrateLimits::new(320 * 180, 0, 30_000, 300_000),
    ResolutionBitrateLimits::new(480 * 270, 300_000, 30_000, 500_000),
    ResolutionBitrateLimits::new(640 * 360, 500_000, 30_000, 800_000),
    ResolutionBitrateLimits::new(960 * 540, 800_000, 30_000, 1_500_000),
    ResolutionBitrateLimits::new(1280 * 720, 1_500_000, 30_000, 2_500_000),
    ResolutionBitrateLimits::new(1920 * 1080, 2_500_000, 30_000, 4_000_000),
];

/// Limits used when the encoder's QP values cannot drive scaling and the
/// caller supplied none of its own.
pub fn default_limits_when_qp_is_untrusted(codec: VideoCodec) -> Vec<ResolutionBitrateLimits> {
    match codec {
        VideoCodec::H265 => H265_LIMITS_WHEN_QP_IS_UNTRUSTED.to_vec(),
        _ => LIMITS_WHEN_QP_IS_UNTRUSTED.to_vec(),
    }
}

/// Find the limits for `frame_size_pixels`.
///
/// Sizes beyond the largest entry get the largest entry, sizes below the
/// smallest get the smallest, exact matches are returned as is. Anything
/// in between is linearly interpolated from its two neighbours, with
/// [`DEFAULT_MIN_BITRATE_BPS`] as the minimum.
pub fn limit_for_resolution(
    frame_size_pixels: Option<u32>,
    limits: &[ResolutionBitrateLimits],
) -> Option<ResolutionBitrateLimits> {
    let pixels = frame_size_pixels.filter(|&p| p > 0)?;

    let mut limits = limits.to_vec();
    limits.sort_by_key(|limit| limit.frame_size_pixels);
    let last = *limits.last()?;

    let Some(index) = limits.iter().position(|l| l.frame_size_pixels >= pixels) else {
        return Some(last);
    };
    let upper = limits[index];
    if upper.frame_size_pixels == pixels || index == 0 {
        return Some(upper);
    }
    let lower = limits[index - 1];

    let alpha = f64::from(pixels - lower.frame_size_pixels)
        / f64::from(upper.frame_size_pixels - lower.frame_size_pixels);
    let interpolate = |low: u32, high: u32| {
        (f64::from(high) * alpha + f64::from(low) * (1.0 - alpha)) as u32
    };
    let min_start_bitrate_bps =
        interpolate(lower.min_start_bitrate_bps, upper.min_start_bitrate_bps);
    let max_bitrate_bps = interpolate(lower.max_bitrate_bps, upper.max_bitrate_bps);

    if max_bitrate_bps < min_start_bitrate_bps {
        warn!(
            lower_pixel_count = lower.frame_size_pixels,
            upper_pixel_count = upper.frame_size_pixels,
            frame_size_pixels = pixels,
            min_start_bitrate_bps,
            max_bitrate_bps,
            "Bitrate interpolation result is abnormal"
        );
        return None;
    }

    Some(ResolutionBitrateLimits::new(
        pixels,
        min_start_bitrate_bps,
        DEFAULT_MIN_BITRATE_BPS,
        max_bitrate_bps,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_limit_without_pixels() {
        let limits = default_limits_when_qp_is_untrusted(VideoCodec::H264);
        assert_eq!(limit_for_resolution(None, &limits), None);
        assert_eq!(limit_for_resolution(Some(0), &limits), None);
        assert_eq!(limit_for_resolution(Some(640 * 360), &[]), None);
    }

    #[test]
    fn test_exact_and_out_of_range_resolutions() {
        let limits = default_limits_when_qp_is_untrusted(VideoCodec::VP8);
        assert_eq!(
            limit_for_resolution(Some(640 * 360), &limits),
            Some(ResolutionBitrateLimits::new(640 * 360, 500_000, 30_000, 800_000))
        );
        assert_eq!(
            limit_for_resolution(Some(3840 * 2160), &limits),
            Some(ResolutionBitrateLimits::new(1920 * 1080, 2_500_000, 30_000, 4_000_000))
        );

        // Smaller than the smallest entry of an unsorted list
        let custom = [
            ResolutionBitrateLimits::new(1280 * 720, 1_000_000, 50_000, 2_000_000),
            ResolutionBitrateLimits::new(640 * 360, 300_000, 50_000, 700_000),
        ];
        assert_eq!(limit_for_resolution(Some(100), &custom), Some(custom[1]));
    }

    #[test]
    fn test_interpolation() {
        let limits = default_limits_when_qp_is_untrusted(VideoCodec::H264);
        // Halfway between 640x360 and 960x540 in pixels
        let pixels = (640 * 360 + 960 * 540) / 2;
        let limit = limit_for_resolution(Some(pixels), &limits).unwrap();
        assert_eq!(limit.frame_size_pixels, pixels);
        assert_eq!(limit.min_start_bitrate_bps, 650_000);
        assert_eq!(limit.min_bitrate_bps, DEFAULT_MIN_BITRATE_BPS);
        assert_eq!(limit.max_bitrate_bps, 1_150_000);
    }

    #[test]
    fn test_h265_table() {
        let limits = default_limits_when_qp_is_untrusted(VideoCodec::H265);
        assert_eq!(limits.len(), 7);
        assert_eq!(
            limit_for_resolution(Some(1280 * 720), &limits).map(|l| l.max_bitrate_bps),
            Some(1_500_000)
        );
    }

    #[test]
    fn test_abnormal_interpolation() {
        let limits = [
            ResolutionBitrateLimits::new(100, 1_000_000, 0, 1_000_000),
            ResolutionBitrateLimits::new(200, 1_000_000, 0, 100_000),
        ];
        assert_eq!(limit_for_resolution(Some(150), &limits), None);
    }
}
