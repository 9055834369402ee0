//! Pass/reject accounting and downstream transit confirmation.
//!
//! The authoritative counts are bumped by the sorting loop when it finishes
//! routing a classified item. The exit sensor only corroborates that items
//! physically left the line; its edges never touch the pass/reject totals.
use crate::classifier::Classification;

/// Process-lifetime totals; each completed cycle bumps exactly one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortCounters {
    pass: u64,
    reject: u64,
}

impl SortCounters {
    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn reject(&self) -> u64 {
        self.reject
    }

    pub fn total(&self) -> u64 {
        self.pass.saturating_add(self.reject)
    }
}

#[derive(Debug, Default)]
pub struct PassCounter {
    counts: SortCounters,
    // None until the first level is seen so start-up never fires an edge.
    last_level: Option<bool>,
    confirmations: u64,
}

impl PassCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the presence level sampled this tick. Returns true exactly when
    /// the level fell from HIGH to LOW.
    pub fn on_tick(&mut self, level: bool) -> bool {
        let fell = matches!(self.last_level, Some(true)) && !level;
        self.last_level = Some(level);
        if fell {
            self.confirmations = self.confirmations.saturating_add(1);
            tracing::info!(confirmations = self.confirmations, "item transit confirmed");
        }
        fell
    }

    /// Count a completed sort. Returns the updated totals.
    pub fn record(&mut self, class: Classification) -> SortCounters {
        if class.is_accept() {
            self.counts.pass = self.counts.pass.saturating_add(1);
        } else {
            self.counts.reject = self.counts.reject.saturating_add(1);
        }
        self.counts
    }

    pub fn counts(&self) -> SortCounters {
        self.counts
    }

    /// Informational count of HIGH to LOW edges on the exit sensor.
    pub fn confirmations(&self) -> u64 {
        self.confirmations
    }

    pub fn last_level(&self) -> Option<bool> {
        self.last_level
    }
}
