//! Median-filtered weight acquisition.
//!
//! A single vibration spike or electrical transient lands at one end of the
//! sorted window and never reaches the estimate.
use sorter_traits::WeightSensor;

use crate::hw_error::map_hw_error;

/// Smallest window; below this the median stops rejecting single spikes.
pub const MIN_SAMPLES: usize = sorter_config::MIN_SAMPLE_COUNT;
/// Largest window; bounds the worst-case read latency.
pub const MAX_SAMPLES: usize = sorter_config::MAX_SAMPLE_COUNT;

/// Filtered result of one measurement event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightEstimate {
    /// Median weight in grams.
    pub grams: f32,
    /// Readings that went into the median; 0 for a degraded (not ready) estimate.
    pub samples: usize,
}

impl WeightEstimate {
    /// Estimate used when the sensor could not deliver a reading.
    pub const fn zero() -> Self {
        Self {
            grams: 0.0,
            samples: 0,
        }
    }

    /// True for a real reading at or above `threshold_g`.
    pub fn is_present(&self, threshold_g: f32) -> bool {
        self.samples > 0 && self.grams >= threshold_g
    }
}

/// Clamp a requested window into [MIN_SAMPLES, MAX_SAMPLES].
#[inline]
pub fn clamp_sample_count(requested: usize) -> usize {
    requested.clamp(MIN_SAMPLES, MAX_SAMPLES)
}

/// Sort `window` in place and return the element at `len / 2`.
///
/// Returns `None` for an empty window.
pub fn median_in_place(window: &mut [f32]) -> Option<f32> {
    if window.is_empty() {
        return None;
    }
    window.sort_unstable_by(f32::total_cmp);
    Some(window[window.len() / 2])
}

/// Takes `sample_count` single conversions from the sensor and reduces them to a median.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightSampler;

impl WeightSampler {
    pub fn new() -> Self {
        Self
    }

    /// Acquire one estimate. Never fails: a sensor that is not ready, a read
    /// error or a non-finite reading all yield `WeightEstimate::zero()`.
    pub fn estimate(&self, sensor: &mut dyn WeightSensor, sample_count: usize) -> WeightEstimate {
        if !sensor.is_ready() {
            tracing::trace!("load cell not ready; skipping read");
            return WeightEstimate::zero();
        }
        let n = clamp_sample_count(sample_count);
        let mut buf = [0.0f32; MAX_SAMPLES];
        for slot in buf.iter_mut().take(n) {
            match sensor.read(1) {
                Ok(g) if g.is_finite() => *slot = g,
                Ok(g) => {
                    tracing::warn!(reading = g, "non-finite load cell reading; dropping estimate");
                    return WeightEstimate::zero();
                }
                Err(e) => {
                    tracing::warn!(error = %map_hw_error(&*e), "load cell read failed; dropping estimate");
                    return WeightEstimate::zero();
                }
            }
        }
        match median_in_place(&mut buf[..n]) {
            Some(grams) => {
                tracing::trace!(grams, samples = n, "weight estimate");
                WeightEstimate { grams, samples: n }
            }
            None => WeightEstimate::zero(),
        }
    }
}
