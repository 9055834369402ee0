#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core sorting logic (hardware-agnostic).
//!
//! This crate provides the single-lane weight sorter. All hardware interactions
//! go through the `sorter_traits` seams: `WeightSensor`, `Actuator`, `Display`,
//! `PresenceSensor` and `Clock`.
//!
//! ## Architecture
//!
//! - **Sampling**: median-of-N weight estimate (`sampler` module)
//! - **Classification**: inclusive accept band (`classifier` module)
//! - **Actuation**: timed push/eject plans (`actuation` module)
//! - **Counting**: pass/reject totals and exit-sensor edges (`counter` module)
//! - **Control**: Idle → Measuring → Classifying → Routing (`sorting` module)
//! - **Driver**: fixed-period blocking runner (`runner` module)

pub mod actuation;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod conversions;
pub mod counter;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod sampler;
pub mod sorting;
pub mod status;

pub use actuation::{ActuationSequencer, ActuatorId, Step, clamp_angle};
pub use builder::{Missing, Set, SorterBuilder};
pub use classifier::{Classification, WeightBand, classify};
pub use config::{ActuationCfg, SamplingCfg, StartupCfg, TimingCfg};
pub use counter::{PassCounter, SortCounters};
pub use error::{BuildError, SorterError};
pub use runner::{RunParams, RunSummary, run, run_observed};
pub use sampler::{WeightEstimate, WeightSampler, median_in_place};
pub use sorting::SortingLoop;
pub use status::{CycleReport, SortState, TickStatus};
