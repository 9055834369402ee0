//! `From` implementations bridging `sorter_config` types to `sorter_core` types.

use std::time::Duration;

use crate::builder::SorterBuilder;
use crate::classifier::WeightBand;
use crate::config::{ActuationCfg, SamplingCfg, StartupCfg, TimingCfg};
use crate::error::BuildError;

// ── SamplingCfg ──────────────────────────────────────────────────────────────

impl From<&sorter_config::SamplingCfg> for SamplingCfg {
    fn from(c: &sorter_config::SamplingCfg) -> Self {
        Self {
            sample_count: c.sample_count,
            presence_threshold_g: c.presence_threshold_g,
        }
    }
}

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&sorter_config::TimingCfg> for TimingCfg {
    fn from(c: &sorter_config::TimingCfg) -> Self {
        Self {
            settle_ms: c.settle_ms,
            push_hold_ms: c.push_hold_ms,
            transit_ms: c.transit_ms,
            eject_hold_ms: c.eject_hold_ms,
            clearance_ms: c.clearance_ms,
        }
    }
}

// ── ActuationCfg ─────────────────────────────────────────────────────────────

impl From<&sorter_config::ActuationCfg> for ActuationCfg {
    fn from(c: &sorter_config::ActuationCfg) -> Self {
        Self {
            push_angle: c.push_angle,
            eject_angle: c.eject_angle,
            rest_angle: c.rest_angle,
        }
    }
}

// ── StartupCfg ───────────────────────────────────────────────────────────────

impl From<&sorter_config::Config> for StartupCfg {
    fn from(c: &sorter_config::Config) -> Self {
        Self {
            calibration_factor: Some(c.sensor.calibration_factor),
            tare_on_start: c.sensor.tare_on_start,
            self_test_angle: c.startup.self_test_angle,
            self_test: Duration::from_millis(c.startup.self_test_ms),
            banner: c.startup.banner.clone(),
            banner_hold: Duration::from_millis(c.startup.banner_ms),
        }
    }
}

// ── WeightBand ───────────────────────────────────────────────────────────────

impl TryFrom<&sorter_config::BandCfg> for WeightBand {
    type Error = BuildError;

    fn try_from(c: &sorter_config::BandCfg) -> Result<Self, Self::Error> {
        WeightBand::new(c.min_g, c.max_g)
    }
}

impl<S, P, E> SorterBuilder<S, P, E> {
    /// Apply every tunable from a validated file config.
    pub fn with_config(self, cfg: &sorter_config::Config) -> crate::error::Result<Self> {
        let band = WeightBand::try_from(&cfg.band).map_err(eyre::Report::new)?;
        Ok(self
            .with_band(band)
            .with_sampling(SamplingCfg::from(&cfg.sampling))
            .with_timing(TimingCfg::from(&cfg.timing))
            .with_actuation(ActuationCfg::from(&cfg.actuation))
            .with_startup(StartupCfg::from(cfg)))
    }
}
