//! Windowed rate estimator

use std::collections::VecDeque;
use tracing::warn;

/// Converts bytes per millisecond into bits per second
pub const BPS_SCALE: f64 = 8000.0;

#[derive(Debug, Clone)]
struct Bucket {
    sum: i64,
    num_samples: u32,
    timestamp: i64,
}

/// Rate of a counter over a sliding window of `window_size_ms`.
///
/// Samples are bucketed by their millisecond timestamp. Until the first
/// sample is a full window old, the rate is computed over the time since
/// that sample instead.
#[derive(Debug, Clone)]
pub struct RateStatistics {
    buckets: VecDeque<Bucket>,
    accumulated_count: i64,
    first_timestamp: Option<i64>,
    num_samples: u32,
    overflow: bool,
    max_window_size_ms: i64,
    current_window_size_ms: i64,
    scale: f64,
}

impl RateStatistics {
    pub fn new(window_size_ms: i64, scale: f64) -> Self {
        Self {
            buckets: VecDeque::new(),
            accumulated_count: 0,
            first_timestamp: None,
            num_samples: 0,
            overflow: false,
            max_window_size_ms: window_size_ms,
            current_window_size_ms: window_size_ms,
            scale,
        }
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
        self.accumulated_count = 0;
        self.first_timestamp = None;
        self.num_samples = 0;
        self.overflow = false;
        self.current_window_size_ms = self.max_window_size_ms;
    }

    /// Add `count` at `now_ms`. A timestamp older than the newest bucket is
    /// counted in that bucket instead.
    pub fn update(&mut self, count: i64, now_ms: i64) {
        debug_assert!(count >= 0);
        self.erase_old(now_ms);
        if self.first_timestamp.is_none() || self.num_samples == 0 {
            self.first_timestamp = Some(now_ms);
        }

        let mut now_ms = now_ms;
        match self.buckets.back().map(|b| b.timestamp) {
            Some(last) if last == now_ms => {}
            Some(last) if now_ms < last => {
                warn!(
                    "Timestamp {} is before the last added timestamp in the rate window: {}, aligning to that",
                    now_ms, last
                );
                now_ms = last;
            }
            _ => self.buckets.push_back(Bucket {
                sum: 0,
                num_samples: 0,
                timestamp: now_ms,
            }),
        }
        if let Some(last) = self.buckets.back_mut() {
            debug_assert_eq!(last.timestamp, now_ms);
            last.sum += count;
            last.num_samples += 1;
        }

        match self.accumulated_count.checked_add(count) {
            Some(total) => self.accumulated_count = total,
            None => self.overflow = true,
        }
        self.num_samples += 1;
    }

    /// Rate at `now_ms`, or `None` without enough data (or after overflow).
    pub fn rate(&mut self, now_ms: i64) -> Option<i64> {
        self.erase_old(now_ms);

        let active_window_size = match self.first_timestamp {
            Some(first) if first <= now_ms - self.current_window_size_ms => {
                self.current_window_size_ms
            }
            Some(first) => now_ms - first + 1,
            None => 0,
        };

        if self.num_samples == 0
            || active_window_size <= 1
            || (self.num_samples <= 1 && active_window_size < self.current_window_size_ms)
            || self.overflow
        {
            return None;
        }

        let scale = self.scale / active_window_size as f64;
        let result = self.accumulated_count as f64 * scale + 0.5;
        if result > i64::MAX as f64 {
            return None;
        }
        Some(result as i64)
    }

    /// Shrink (or restore) the window, up to the size given at construction.
    pub fn set_window_size(&mut self, window_size_ms: i64, now_ms: i64) -> bool {
        if window_size_ms <= 0 || window_size_ms > self.max_window_size_ms {
            return false;
        }
        if let Some(first) = self.first_timestamp {
            // Bucket timestamps outside the new window no longer count
            self.first_timestamp = Some(first.max(now_ms - window_size_ms + 1));
        }
        self.current_window_size_ms = window_size_ms;
        self.erase_old(now_ms);
        true
    }

    fn erase_old(&mut self, now_ms: i64) {
        let new_oldest_time = now_ms - self.current_window_size_ms + 1;
        while let Some(oldest) = self.buckets.front() {
            if oldest.timestamp >= new_oldest_time {
                break;
            }
            self.accumulated_count -= oldest.sum;
            self.num_samples -= oldest.num_samples;
            self.buckets.pop_front();
        }
        // An overflow is sticky until reset
    }
}
