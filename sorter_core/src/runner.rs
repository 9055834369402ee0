//! Blocking driver for `SortingLoop`.
//!
//! Ticks the loop at a fixed period on the loop's own clock until a cycle
//! limit, a tick limit, or an external stop request ends the run.
use std::time::Duration;

use crate::error::{BuildError, Result};
use crate::sorting::SortingLoop;
use crate::status::{CycleReport, SortState, TickStatus};

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Control-loop period; must be non-zero.
    pub tick: Duration,
    /// Stop after this many completed sort cycles.
    pub max_cycles: Option<u64>,
    /// Hard cap on loop iterations, honored even mid-cycle.
    pub max_ticks: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            max_cycles: None,
            max_ticks: None,
        }
    }
}

/// Totals for one `run` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub pass: u64,
    pub reject: u64,
    pub confirmations: u64,
    pub ticks: u64,
}

/// Run until `stop` returns true at an idle boundary or a limit is reached.
pub fn run<F>(sorter: &mut SortingLoop, params: RunParams, stop: F) -> Result<RunSummary>
where
    F: FnMut(&SortingLoop) -> bool,
{
    run_observed(sorter, params, stop, |_| {})
}

/// Like `run`, handing every completed cycle to `on_cycle`.
///
/// `stop` is only consulted while the loop is idle, so an item that is
/// already being routed always finishes its sequence.
pub fn run_observed<F, C>(
    sorter: &mut SortingLoop,
    params: RunParams,
    mut stop: F,
    mut on_cycle: C,
) -> Result<RunSummary>
where
    F: FnMut(&SortingLoop) -> bool,
    C: FnMut(&CycleReport),
{
    if params.tick.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick period must be > 0",
        )));
    }
    if params.max_cycles == Some(0) {
        return Ok(RunSummary::default());
    }

    let clock = sorter.clock().clone();
    let start_counts = sorter.counters();
    let start_confirmations = sorter.confirmations();
    let mut cycles = 0u64;
    let mut ticks = 0u64;

    tracing::info!(
        tick_ms = u64::try_from(params.tick.as_millis()).unwrap_or(u64::MAX),
        max_cycles = ?params.max_cycles,
        "sorting loop started"
    );

    loop {
        if sorter.state() == SortState::Idle && stop(sorter) {
            tracing::info!("stop requested");
            break;
        }

        ticks = ticks.saturating_add(1);
        if let TickStatus::Completed(report) = sorter.tick() {
            cycles = cycles.saturating_add(1);
            on_cycle(&report);
            if params.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
        }

        if params.max_ticks.is_some_and(|max| ticks >= max) {
            if sorter.state() != SortState::Idle {
                tracing::warn!(state = %sorter.state(), "tick limit reached mid-cycle");
            }
            break;
        }

        clock.sleep(params.tick);
    }

    let totals = sorter.counters();
    let out = RunSummary {
        cycles,
        pass: totals.pass().saturating_sub(start_counts.pass()),
        reject: totals.reject().saturating_sub(start_counts.reject()),
        confirmations: sorter.confirmations().saturating_sub(start_confirmations),
        ticks,
    };
    tracing::info!(
        cycles = out.cycles,
        pass = out.pass,
        reject = out.reject,
        confirmations = out.confirmations,
        ticks = out.ticks,
        "sorting loop stopped"
    );
    Ok(out)
}
