//! The sorting control loop.
//!
//! One item at a time: Idle → Measuring → Classifying → Routing → Idle.
//! Every wait is a deadline checked against the injected clock, so `tick`
//! returns promptly and can be driven from a blocking runner or a
//! cooperative scheduler alike. The exit sensor is sampled on every tick,
//! including settle and routing waits, unlike a loop that blocks in its delays.

use std::sync::Arc;
use std::time::Instant;

use sorter_traits::{Actuator, Clock, Display, PresenceSensor, WeightSensor};

use crate::actuation::{self, ActuationSequencer, ActuatorId, clamp_angle};
use crate::classifier::{Classification, WeightBand, classify};
use crate::config::{SamplingCfg, StartupCfg, TimingCfg};
use crate::counter::{PassCounter, SortCounters};
use crate::hw_error::map_hw_error;
use crate::sampler::{WeightEstimate, WeightSampler};
use crate::status::{CycleReport, SortState, TickStatus};

/// Per-cycle execution state, owned by the loop.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Cycle {
    Idle,
    Measuring {
        started_ms: u64,
        settle_until_ms: u64,
    },
    Classifying {
        started_ms: u64,
        estimate: WeightEstimate,
        class: Classification,
    },
    Routing {
        started_ms: u64,
        estimate: WeightEstimate,
        class: Classification,
        clear_at_ms: Option<u64>,
    },
}

impl Cycle {
    fn state(&self) -> SortState {
        match self {
            Cycle::Idle => SortState::Idle,
            Cycle::Measuring { .. } => SortState::Measuring,
            Cycle::Classifying { .. } => SortState::Classifying,
            Cycle::Routing { .. } => SortState::Routing,
        }
    }
}

pub struct SortingLoop {
    pub(crate) sensor: Box<dyn WeightSensor>,
    pub(crate) pusher: Box<dyn Actuator>,
    pub(crate) ejector: Box<dyn Actuator>,
    pub(crate) display: Box<dyn Display>,
    pub(crate) presence: Box<dyn PresenceSensor>,
    pub(crate) sampler: WeightSampler,
    pub(crate) band: WeightBand,
    pub(crate) sequencer: ActuationSequencer,
    pub(crate) counter: PassCounter,
    pub(crate) sampling: SamplingCfg,
    pub(crate) timing: TimingCfg,
    pub(crate) startup: StartupCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) cycle: Cycle,
    pub(crate) ticks: u64,
}

impl core::fmt::Debug for SortingLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SortingLoop")
            .field("state", &self.cycle.state())
            .field("band", &self.band)
            .field("counts", &self.counter.counts())
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl SortingLoop {
    pub fn state(&self) -> SortState {
        self.cycle.state()
    }

    pub fn band(&self) -> WeightBand {
        self.band
    }

    /// Replace the acceptance band. Takes effect at the next classification;
    /// a cycle already past classification keeps its decision.
    pub fn set_band(&mut self, band: WeightBand) {
        tracing::info!(min_g = band.min_g(), max_g = band.max_g(), "weight band updated");
        self.band = band;
    }

    pub fn counters(&self) -> SortCounters {
        self.counter.counts()
    }

    /// Informational exit-sensor confirmations.
    pub fn confirmations(&self) -> u64 {
        self.counter.confirmations()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Zero the scale. Only meaningful with an empty platform.
    pub fn tare(&mut self) -> crate::error::Result<()> {
        self.sensor
            .tare()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    pub fn set_calibration(&mut self, factor: f32) -> crate::error::Result<()> {
        self.sensor
            .set_calibration(factor)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    /// Power-on sequence: calibration, tare, actuator self test and banner.
    /// Blocks on the loop's clock. Failures are logged and never abort.
    pub fn start_up(&mut self) {
        if let Some(factor) = self.startup.calibration_factor
            && let Err(e) = self.set_calibration(factor)
        {
            tracing::warn!(factor, error = %e, "failed to apply calibration factor");
        }
        if self.startup.tare_on_start
            && let Err(e) = self.tare()
        {
            tracing::warn!(error = %e, "tare failed at start-up");
        }

        let test_angle = clamp_angle(self.startup.self_test_angle);
        let rest = self.sequencer.rest_angle();
        actuation::command(&mut *self.pusher, ActuatorId::Pusher, test_angle);
        actuation::command(&mut *self.ejector, ActuatorId::Ejector, test_angle);
        self.clock.sleep(self.startup.self_test);
        actuation::command(&mut *self.pusher, ActuatorId::Pusher, rest);
        actuation::command(&mut *self.ejector, ActuatorId::Ejector, rest);

        self.display_clear();
        let banner = self.startup.banner.clone();
        self.display_text(&banner, 0, 0);
        self.clock.sleep(self.startup.banner_hold);
        self.display_clear();

        self.epoch = self.clock.now();
        tracing::info!(
            min_g = self.band.min_g(),
            max_g = self.band.max_g(),
            "sorter ready"
        );
    }

    /// One control-loop iteration.
    pub fn tick(&mut self) -> TickStatus {
        self.ticks = self.ticks.saturating_add(1);
        let now = self.clock.ms_since(self.epoch);
        self.poll_presence();

        match self.cycle {
            Cycle::Idle => {
                let est = self
                    .sampler
                    .estimate(&mut *self.sensor, self.sampling.sample_count);
                if !est.is_present(self.sampling.presence_threshold_g) {
                    return TickStatus::Idle;
                }
                tracing::debug!(grams = est.grams, "item detected");
                self.cycle = Cycle::Measuring {
                    started_ms: now,
                    settle_until_ms: now.saturating_add(self.timing.settle_ms),
                };
                TickStatus::Busy(SortState::Measuring)
            }
            Cycle::Measuring {
                started_ms,
                settle_until_ms,
            } => {
                if now < settle_until_ms {
                    return TickStatus::Busy(SortState::Measuring);
                }
                let est = self
                    .sampler
                    .estimate(&mut *self.sensor, self.sampling.sample_count);
                if !est.is_present(self.sampling.presence_threshold_g) {
                    tracing::warn!(
                        grams = est.grams,
                        "item left the platform before classification"
                    );
                    self.cycle = Cycle::Idle;
                    return TickStatus::Idle;
                }
                let class = classify(est.grams, &self.band);
                tracing::debug!(grams = est.grams, result = %class, "item classified");
                self.display_weight(est.grams);
                self.cycle = Cycle::Classifying {
                    started_ms,
                    estimate: est,
                    class,
                };
                self.dispatch(now)
            }
            Cycle::Classifying { .. } => self.dispatch(now),
            Cycle::Routing { .. } => self.route(now),
        }
    }

    /// Classifying → Routing, then advance the fresh plan in the same tick.
    fn dispatch(&mut self, now: u64) -> TickStatus {
        let Cycle::Classifying {
            started_ms,
            estimate,
            class,
        } = self.cycle
        else {
            return TickStatus::Busy(self.cycle.state());
        };
        self.sequencer.begin(class);
        self.cycle = Cycle::Routing {
            started_ms,
            estimate,
            class,
            clear_at_ms: None,
        };
        self.route(now)
    }

    fn route(&mut self, now: u64) -> TickStatus {
        let Cycle::Routing {
            started_ms,
            estimate,
            class,
            mut clear_at_ms,
        } = self.cycle
        else {
            return TickStatus::Busy(self.cycle.state());
        };

        if clear_at_ms.is_none()
            && self
                .sequencer
                .poll(now, &mut *self.pusher, &mut *self.ejector)
        {
            clear_at_ms = Some(now.saturating_add(self.timing.clearance_ms));
        }

        match clear_at_ms {
            Some(at) if now >= at => {
                let report = self.complete(now, started_ms, estimate, class);
                TickStatus::Completed(report)
            }
            _ => {
                self.cycle = Cycle::Routing {
                    started_ms,
                    estimate,
                    class,
                    clear_at_ms,
                };
                TickStatus::Busy(SortState::Routing)
            }
        }
    }

    /// Routing → Idle: count exactly once and report.
    fn complete(
        &mut self,
        now: u64,
        started_ms: u64,
        estimate: WeightEstimate,
        class: Classification,
    ) -> CycleReport {
        let counts = self.counter.record(class);
        let report = CycleReport {
            weight_g: estimate.grams,
            samples: estimate.samples,
            classification: class,
            pass: counts.pass(),
            reject: counts.reject(),
            cycle_ms: now.saturating_sub(started_ms),
        };

        self.display_clear();
        let line0 = format!("{} {:.1}g", class.short_label(), estimate.grams);
        let line1 = format!("P:{} R:{}", counts.pass(), counts.reject());
        self.display_text(&line0, 0, 0);
        self.display_text(&line1, 0, 1);

        tracing::info!(
            weight_g = report.weight_g,
            result = %class,
            pass = report.pass,
            reject = report.reject,
            confirmations = self.counter.confirmations(),
            cycle_ms = report.cycle_ms,
            "sort cycle complete"
        );
        self.cycle = Cycle::Idle;
        report
    }

    fn poll_presence(&mut self) {
        match self.presence.is_high() {
            Ok(level) => {
                self.counter.on_tick(level);
            }
            Err(e) => {
                // Keep the previous level on a failed read.
                tracing::warn!(error = %map_hw_error(&*e), "presence read failed");
            }
        }
    }

    fn display_weight(&mut self, grams: f32) {
        if let Err(e) = self.display.show_weight(grams) {
            tracing::warn!(error = %map_hw_error(&*e), "display update failed");
        }
    }

    fn display_text(&mut self, text: &str, col: u8, row: u8) {
        if let Err(e) = self.display.show_text(text, col, row) {
            tracing::warn!(error = %map_hw_error(&*e), "display update failed");
        }
    }

    fn display_clear(&mut self) {
        if let Err(e) = self.display.clear() {
            tracing::warn!(error = %map_hw_error(&*e), "display clear failed");
        }
    }
}
