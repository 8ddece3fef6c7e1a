//! Smoothed transfer-rate estimation.

use std::time::{Duration, Instant};

/// Default EMA weight given to the newest instantaneous rate.
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Smoothed rates at or below this many bytes/sec yield no ETA.
pub const MIN_RATE: f64 = 1.0;

/// Byte counter observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub at: Instant,
    pub bytes: u64,
}

/// Exponentially-weighted moving average of throughput.
///
/// Only the most recent sample is retained; each new sample produces an
/// instantaneous rate against it and then replaces it. The average is
/// seeded with the first non-zero instantaneous rate instead of ramping
/// up from zero.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    alpha: f64,
    previous: Option<RateSample>,
    instantaneous: f64,
    smoothed: Option<f64>,
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl RateEstimator {
    /// Creates an estimator with the given EMA weight.
    ///
    /// `alpha` is clamped into `(0, 1]`.
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_ALPHA
        };
        Self {
            alpha,
            previous: None,
            instantaneous: 0.0,
            smoothed: None,
        }
    }

    /// Creates an estimator whose baseline is `bytes` at `at`.
    pub fn starting_at(alpha: f64, at: Instant, bytes: u64) -> Self {
        let mut estimator = Self::new(alpha);
        estimator.previous = Some(RateSample { at, bytes });
        estimator
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Feeds the counter value observed at `at`.
    ///
    /// Returns the instantaneous rate in bytes/sec, or `None` when there was
    /// no baseline yet or no time has passed since the previous sample (the
    /// sample is then ignored).
    pub fn sample(&mut self, bytes: u64, at: Instant) -> Option<f64> {
        let Some(previous) = self.previous else {
            self.previous = Some(RateSample { at, bytes });
            return None;
        };

        let elapsed = at
            .checked_duration_since(previous.at)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        if elapsed <= 0.0 {
            return None;
        }

        let rate = bytes.saturating_sub(previous.bytes) as f64 / elapsed;
        self.previous = Some(RateSample { at, bytes });
        self.instantaneous = rate;

        match self.smoothed {
            Some(smoothed) => {
                self.smoothed = Some(self.alpha * rate + (1.0 - self.alpha) * smoothed);
            }
            None if rate > 0.0 => self.smoothed = Some(rate),
            None => {}
        }

        Some(rate)
    }

    /// Rate computed from the last two samples, in bytes/sec.
    pub fn instantaneous(&self) -> f64 {
        self.instantaneous
    }

    /// Smoothed rate in bytes/sec (0 until seeded).
    pub fn smoothed(&self) -> f64 {
        self.smoothed.unwrap_or(0.0)
    }

    /// Estimated time to move the remaining `total - done` bytes.
    pub fn eta(&self, total: u64, done: u64) -> Option<Duration> {
        eta_for(total.saturating_sub(done), self.smoothed())
    }
}

/// Time to move `remaining` bytes at `rate` bytes/sec.
///
/// Returns `None` (unknown) when `rate` is at or below [`MIN_RATE`] or not
/// finite.
pub fn eta_for(remaining: u64, rate: f64) -> Option<Duration> {
    if !rate.is_finite() || rate <= MIN_RATE {
        return None;
    }
    Duration::try_from_secs_f64(remaining as f64 / rate).ok()
}
