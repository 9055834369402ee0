//! Simulated single-lane belt.
//!
//! Items are queued onto the weighing platform one at a time. Driving the
//! pusher past its threshold moves the platform item onto the belt; the
//! ejector removes an item that is still in transit. Items that reach the end
//! of the belt pull the presence line LOW for a few polls.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use sorter_traits::{Actuator, BoxError, PresenceSensor, WeightSensor};
use tracing::{debug, trace};

use crate::error::HwError;

/// Commands at or above this angle count as a push / eject stroke.
const STROKE_THRESHOLD_DEG: u8 = 90;

#[derive(Debug, Clone)]
pub struct SimCfg {
    /// Presence polls an item needs to travel from the platform to the exit sensor.
    pub transit_polls: u32,
    /// Presence polls the exit line stays LOW per item.
    pub pulse_polls: u32,
    /// Inject a spike of `spike_g` on every n-th sensor read.
    pub spike_every: Option<u64>,
    pub spike_g: f32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            transit_polls: 200,
            pulse_polls: 5,
            spike_every: None,
            spike_g: 500.0,
        }
    }
}

/// Counters describing what physically happened on the simulated belt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub exited: u64,
    pub ejected: u64,
    pub remaining: usize,
    pub on_platform: bool,
    pub in_transit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Pusher,
    Ejector,
}

#[derive(Debug)]
struct Transit {
    grams: f32,
    polls_left: u32,
}

#[derive(Debug)]
struct LineState {
    cfg: SimCfg,
    pending: VecDeque<f32>,
    platform: Option<f32>,
    in_transit: Option<Transit>,
    exit_low_polls: u32,
    reads: u64,
    ready: bool,
    tare_g: f32,
    calibration: f32,
    pusher_angles: Vec<u8>,
    ejector_angles: Vec<u8>,
    exited: u64,
    ejected: u64,
}

impl LineState {
    fn load_platform(&mut self) {
        if self.platform.is_none()
            && let Some(next) = self.pending.pop_front()
        {
            debug!(grams = next, "sim: item arrives on platform");
            self.platform = Some(next);
        }
    }

    fn command(&mut self, role: Role, degrees: u8) {
        match role {
            Role::Pusher => {
                self.pusher_angles.push(degrees);
                if degrees >= STROKE_THRESHOLD_DEG
                    && let Some(grams) = self.platform.take()
                {
                    if let Some(prev) = self.in_transit.take() {
                        // Belt only holds one item between stations; the older one leaves.
                        self.exited += 1;
                        trace!(grams = prev.grams, "sim: item flushed off belt");
                    }
                    self.in_transit = Some(Transit {
                        grams,
                        polls_left: self.cfg.transit_polls.max(1),
                    });
                    debug!(grams, "sim: item pushed onto belt");
                }
            }
            Role::Ejector => {
                self.ejector_angles.push(degrees);
                if degrees >= STROKE_THRESHOLD_DEG
                    && let Some(t) = self.in_transit.take()
                {
                    self.ejected += 1;
                    debug!(grams = t.grams, "sim: item ejected");
                }
            }
        }
    }

    fn poll_presence(&mut self) -> bool {
        if self.exit_low_polls > 0 {
            self.exit_low_polls -= 1;
            return false;
        }
        if let Some(t) = self.in_transit.as_mut() {
            t.polls_left = t.polls_left.saturating_sub(1);
            if t.polls_left == 0 {
                let grams = t.grams;
                self.in_transit = None;
                self.exited += 1;
                self.exit_low_polls = self.cfg.pulse_polls.saturating_sub(1);
                debug!(grams, "sim: item passes exit sensor");
                return false;
            }
        }
        true
    }
}

/// Shared simulated line; hand out collaborator handles with the accessor methods.
#[derive(Debug, Clone)]
pub struct SimLine {
    state: Rc<RefCell<LineState>>,
}

impl Default for SimLine {
    fn default() -> Self {
        Self::new(SimCfg::default())
    }
}

impl SimLine {
    pub fn new(cfg: SimCfg) -> Self {
        Self {
            state: Rc::new(RefCell::new(LineState {
                cfg,
                pending: VecDeque::new(),
                platform: None,
                in_transit: None,
                exit_low_polls: 0,
                reads: 0,
                ready: true,
                tare_g: 0.0,
                calibration: 1.0,
                pusher_angles: Vec::new(),
                ejector_angles: Vec::new(),
                exited: 0,
                ejected: 0,
            })),
        }
    }

    /// Queue an item for the weighing platform.
    pub fn enqueue(&self, grams: f32) {
        self.state.borrow_mut().pending.push_back(grams);
    }

    pub fn enqueue_all(&self, items: impl IntoIterator<Item = f32>) {
        self.state.borrow_mut().pending.extend(items);
    }

    /// Put a load directly on the platform, bypassing the queue.
    pub fn place(&self, grams: f32) {
        self.state.borrow_mut().platform = Some(grams);
    }

    /// Take whatever is on the platform off by hand.
    pub fn lift(&self) -> Option<f32> {
        self.state.borrow_mut().platform.take()
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().ready = ready;
    }

    pub fn stats(&self) -> LineStats {
        let s = self.state.borrow();
        LineStats {
            exited: s.exited,
            ejected: s.ejected,
            remaining: s.pending.len(),
            on_platform: s.platform.is_some(),
            in_transit: s.in_transit.is_some(),
        }
    }

    /// True when nothing is queued, weighed or travelling.
    pub fn is_drained(&self) -> bool {
        let st = self.stats();
        st.remaining == 0 && !st.on_platform && !st.in_transit
    }

    /// Total sensor conversions requested so far.
    pub fn reads(&self) -> u64 {
        self.state.borrow().reads
    }

    pub fn calibration(&self) -> f32 {
        self.state.borrow().calibration
    }

    pub fn pusher_angles(&self) -> Vec<u8> {
        self.state.borrow().pusher_angles.clone()
    }

    pub fn ejector_angles(&self) -> Vec<u8> {
        self.state.borrow().ejector_angles.clone()
    }

    pub fn sensor(&self) -> SimSensor {
        SimSensor {
            state: self.state.clone(),
        }
    }

    pub fn pusher(&self) -> SimActuator {
        SimActuator {
            state: self.state.clone(),
            role: Role::Pusher,
        }
    }

    pub fn ejector(&self) -> SimActuator {
        SimActuator {
            state: self.state.clone(),
            role: Role::Ejector,
        }
    }

    pub fn presence(&self) -> SimPresence {
        SimPresence {
            state: self.state.clone(),
        }
    }
}

/// Simulated load cell reporting grams directly.
pub struct SimSensor {
    state: Rc<RefCell<LineState>>,
}

impl WeightSensor for SimSensor {
    fn read(&mut self, samples: u8) -> Result<f32, BoxError> {
        let mut s = self.state.borrow_mut();
        if !s.ready {
            return Err(Box::new(HwError::NotReady));
        }
        s.load_platform();
        s.reads = s.reads.saturating_add(u64::from(samples.max(1)));
        let mut grams = s.platform.unwrap_or(0.0) - s.tare_g;
        if let Some(n) = s.cfg.spike_every
            && n > 0
            && s.reads % n == 0
        {
            grams += s.cfg.spike_g;
        }
        trace!(grams, "sim: load cell read");
        Ok(grams)
    }

    fn is_ready(&mut self) -> bool {
        self.state.borrow().ready
    }

    fn tare(&mut self) -> Result<(), BoxError> {
        let mut s = self.state.borrow_mut();
        if !s.ready {
            return Err(Box::new(HwError::NotReady));
        }
        s.tare_g = s.platform.unwrap_or(0.0);
        Ok(())
    }

    fn set_calibration(&mut self, factor: f32) -> Result<(), BoxError> {
        if !factor.is_finite() || factor == 0.0 {
            return Err(Box::new(HwError::Calibration(factor)));
        }
        self.state.borrow_mut().calibration = factor;
        Ok(())
    }
}

/// Simulated servo; records every commanded angle.
pub struct SimActuator {
    state: Rc<RefCell<LineState>>,
    role: Role,
}

impl Actuator for SimActuator {
    fn set_angle(&mut self, degrees: u8) -> Result<(), BoxError> {
        if degrees > 180 {
            return Err(Box::new(HwError::Gpio(format!(
                "servo angle {degrees} out of range"
            ))));
        }
        self.state.borrow_mut().command(self.role, degrees);
        Ok(())
    }
}

/// Simulated exit sensor; HIGH while the beam is clear.
pub struct SimPresence {
    state: Rc<RefCell<LineState>>,
}

impl PresenceSensor for SimPresence {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Ok(self.state.borrow_mut().poll_presence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pusher_moves_platform_item_onto_belt() {
        let line = SimLine::default();
        line.enqueue(120.0);
        let mut sensor = line.sensor();
        assert_eq!(sensor.read(1).unwrap(), 120.0);
        line.pusher().set_angle(180).unwrap();
        let st = line.stats();
        assert!(!st.on_platform);
        assert!(st.in_transit);
    }

    #[test]
    fn rest_command_does_not_move_item() {
        let line = SimLine::default();
        line.place(80.0);
        line.pusher().set_angle(0).unwrap();
        assert!(line.stats().on_platform);
    }

    #[test]
    fn tare_zeroes_current_load() {
        let line = SimLine::default();
        line.place(12.5);
        let mut sensor = line.sensor();
        sensor.tare().unwrap();
        assert_eq!(sensor.read(1).unwrap(), 0.0);
    }
}
