//! Type-state builder for `SortingLoop`.
//!
//! The builder enforces at compile time that the weight sensor and both
//! actuators are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use sorter_traits::clock::{Clock, MonotonicClock};
use sorter_traits::{Actuator, Display, PresenceSensor, WeightSensor};

use crate::actuation::ActuationSequencer;
use crate::classifier::WeightBand;
use crate::config::{ActuationCfg, SamplingCfg, StartupCfg, TimingCfg};
use crate::counter::PassCounter;
use crate::error::{BuildError, Result};
use crate::mocks::{NoPresence, NullDisplay};
use crate::sampler::{WeightSampler, clamp_sample_count};
use crate::sorting::{Cycle, SortingLoop};

impl SortingLoop {
    /// Start building a sorting loop.
    pub fn builder() -> SorterBuilder<Missing, Missing, Missing> {
        SorterBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `SortingLoop`. Display and exit sensor are optional.
pub struct SorterBuilder<S, P, E> {
    sensor: Option<Box<dyn WeightSensor>>,
    pusher: Option<Box<dyn Actuator>>,
    ejector: Option<Box<dyn Actuator>>,
    display: Option<Box<dyn Display>>,
    presence: Option<Box<dyn PresenceSensor>>,
    band: Option<WeightBand>,
    sampling: Option<SamplingCfg>,
    timing: Option<TimingCfg>,
    actuation: Option<ActuationCfg>,
    startup: Option<StartupCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
    _p: PhantomData<P>,
    _e: PhantomData<E>,
}

impl Default for SorterBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            pusher: None,
            ejector: None,
            display: None,
            presence: None,
            band: None,
            sampling: None,
            timing: None,
            actuation: None,
            startup: None,
            clock: None,
            _s: PhantomData,
            _p: PhantomData,
            _e: PhantomData,
        }
    }
}

impl<S, P, E> SorterBuilder<S, P, E> {
    fn retag<S2, P2, E2>(self) -> SorterBuilder<S2, P2, E2> {
        SorterBuilder {
            sensor: self.sensor,
            pusher: self.pusher,
            ejector: self.ejector,
            display: self.display,
            presence: self.presence,
            band: self.band,
            sampling: self.sampling,
            timing: self.timing,
            actuation: self.actuation,
            startup: self.startup,
            clock: self.clock,
            _s: PhantomData,
            _p: PhantomData,
            _e: PhantomData,
        }
    }

    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<SortingLoop> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let pusher = self
            .pusher
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPusher))?;
        let ejector = self
            .ejector
            .ok_or_else(|| eyre::Report::new(BuildError::MissingEjector))?;
        let band = self
            .band
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBand))?;

        let sampling = self.sampling.unwrap_or_default();
        let timing = self.timing.unwrap_or_default();
        let actuation = self.actuation.unwrap_or_default();
        let startup = self.startup.unwrap_or_default();

        // ── Validation ───────────────────────────────────────────────────────
        if !sampling.presence_threshold_g.is_finite()
            || sampling.presence_threshold_g.is_sign_negative()
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "presence_threshold_g must be finite and >= 0",
            )));
        }
        if clamp_sample_count(sampling.sample_count) != sampling.sample_count {
            tracing::warn!(
                requested = sampling.sample_count,
                used = clamp_sample_count(sampling.sample_count),
                "sample_count outside [3, 7]; clamping"
            );
        }
        if let Some(f) = startup.calibration_factor
            && (!f.is_finite() || f == 0.0)
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "calibration factor must be finite and non-zero",
            )));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        Ok(SortingLoop {
            sensor,
            pusher,
            ejector,
            display: self.display.unwrap_or_else(|| Box::new(NullDisplay)),
            presence: self.presence.unwrap_or_else(|| Box::new(NoPresence)),
            sampler: WeightSampler::new(),
            band,
            sequencer: ActuationSequencer::new(actuation, &timing),
            counter: PassCounter::new(),
            sampling,
            timing,
            startup,
            clock,
            epoch,
            cycle: Cycle::Idle,
            ticks: 0,
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, P, E> SorterBuilder<S, P, E> {
    pub fn with_band(mut self, band: WeightBand) -> Self {
        self.band = Some(band);
        self
    }
    /// Convenience for `with_band(WeightBand::new(min, max)?)`.
    pub fn with_band_grams(mut self, min_g: f32, max_g: f32) -> Result<Self> {
        self.band = Some(WeightBand::new(min_g, max_g).map_err(eyre::Report::new)?);
        Ok(self)
    }
    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.sampling = Some(sampling);
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_actuation(mut self, actuation: ActuationCfg) -> Self {
        self.actuation = Some(actuation);
        self
    }
    pub fn with_startup(mut self, startup: StartupCfg) -> Self {
        self.startup = Some(startup);
        self
    }
    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    /// Downstream exit sensor; without one no transit is ever confirmed.
    pub fn with_presence(mut self, presence: impl PresenceSensor + 'static) -> Self {
        self.presence = Some(Box::new(presence));
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<P, E> SorterBuilder<Missing, P, E> {
    pub fn with_sensor(
        mut self,
        sensor: impl WeightSensor + 'static,
    ) -> SorterBuilder<Set, P, E> {
        self.sensor = Some(Box::new(sensor));
        self.retag()
    }
}

impl<S, E> SorterBuilder<S, Missing, E> {
    pub fn with_pusher(mut self, pusher: impl Actuator + 'static) -> SorterBuilder<S, Set, E> {
        self.pusher = Some(Box::new(pusher));
        self.retag()
    }
}

impl<S, P> SorterBuilder<S, P, Missing> {
    pub fn with_ejector(mut self, ejector: impl Actuator + 'static) -> SorterBuilder<S, P, Set> {
        self.ejector = Some(Box::new(ejector));
        self.retag()
    }
}

impl SorterBuilder<Set, Set, Set> {
    /// Validate and build. Only available when sensor and both actuators are set.
    pub fn build(self) -> Result<SortingLoop> {
        self.try_build()
    }
}
