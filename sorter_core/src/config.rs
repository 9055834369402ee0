//! Configuration types for the sorting loop.
//!
//! These are the runtime configuration structs used by `SortingLoop`.
//! They are separate from the TOML-deserialized config in `sorter_config`.

use std::time::Duration;

/// Weight acquisition and presence gating.
#[derive(Debug, Clone)]
pub struct SamplingCfg {
    /// Median window per estimate; clamped to [3, 7] at use.
    pub sample_count: usize,
    /// Estimates below this many grams are treated as an empty platform.
    pub presence_threshold_g: f32,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            sample_count: 5,
            presence_threshold_g: 10.0,
        }
    }
}

/// Belt timing in milliseconds. Installation specific.
#[derive(Debug, Clone)]
pub struct TimingCfg {
    pub settle_ms: u64,
    pub push_hold_ms: u64,
    pub transit_ms: u64,
    pub eject_hold_ms: u64,
    pub clearance_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            push_hold_ms: 500,
            transit_ms: 1000,
            eject_hold_ms: 500,
            clearance_ms: 300,
        }
    }
}

impl TimingCfg {
    /// All waits set to zero; handy when driving the loop tick by tick.
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            push_hold_ms: 0,
            transit_ms: 0,
            eject_hold_ms: 0,
            clearance_ms: 0,
        }
    }
}

/// Actuator angles in degrees. Values above 180 are clamped when commanded.
#[derive(Debug, Clone, Copy)]
pub struct ActuationCfg {
    pub push_angle: u16,
    pub eject_angle: u16,
    pub rest_angle: u16,
}

impl Default for ActuationCfg {
    fn default() -> Self {
        Self {
            push_angle: 180,
            eject_angle: 145,
            rest_angle: 0,
        }
    }
}

/// Power-on sequence.
#[derive(Debug, Clone)]
pub struct StartupCfg {
    pub calibration_factor: Option<f32>,
    pub tare_on_start: bool,
    pub self_test_angle: u16,
    pub self_test: Duration,
    pub banner: String,
    pub banner_hold: Duration,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            calibration_factor: None,
            tare_on_start: true,
            self_test_angle: 90,
            self_test: Duration::from_millis(1000),
            banner: "SYSTEM READY...".to_string(),
            banner_hold: Duration::from_millis(2000),
        }
    }
}
