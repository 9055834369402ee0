//! Sort state and per-tick status returned from the control loop.

use crate::classifier::Classification;

/// Externally visible state of the sorting loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortState {
    /// Platform empty (below presence threshold).
    Idle,
    /// Item detected; waiting for the platform to settle.
    Measuring,
    /// Settled reading taken and classified.
    Classifying,
    /// Actuator sequence or clearance delay in progress.
    Routing,
}

impl std::fmt::Display for SortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SortState::Idle => "idle",
            SortState::Measuring => "measuring",
            SortState::Classifying => "classifying",
            SortState::Routing => "routing",
        })
    }
}

/// Summary of one completed sort cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub weight_g: f32,
    pub samples: usize,
    pub classification: Classification,
    pub pass: u64,
    pub reject: u64,
    /// Time from first detection to return to idle.
    pub cycle_ms: u64,
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "weight={:.1} g result={} pass={} reject={}",
            self.weight_g, self.classification, self.pass, self.reject
        )
    }
}

/// Result of a single control-loop tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickStatus {
    /// Nothing on the platform.
    Idle,
    /// A cycle is in progress in the given state.
    Busy(SortState),
    /// A cycle finished this tick; the loop is idle again.
    Completed(CycleReport),
}
