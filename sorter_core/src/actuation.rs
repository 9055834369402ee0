//! Timed actuator sequences for routing one item.
//!
//! A routing maneuver is a plan of `Step`s. `poll` issues every command that
//! is due and returns as soon as it reaches an unexpired wait, so the control
//! loop never blocks. `run_blocking` executes a whole plan through a `Clock`.
//!
//! Commands are fire-and-forget: there is no position feedback, and the plan
//! assumes each motion completes inside its hold window.
use std::collections::VecDeque;
use std::time::Duration;

use sorter_traits::{Actuator, Clock};

use crate::classifier::Classification;
use crate::config::{ActuationCfg, TimingCfg};
use crate::hw_error::map_hw_error;

/// Largest angle a servo accepts.
pub const MAX_ANGLE: u16 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorId {
    /// Actuator A: pushes the item off the platform onto the belt.
    Pusher,
    /// Actuator B: knocks rejected items off the belt downstream.
    Ejector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Command { actuator: ActuatorId, degrees: u8 },
    Wait(Duration),
}

/// Clamp a commanded angle into [0, 180].
#[inline]
pub fn clamp_angle(degrees: u16) -> u8 {
    if degrees > MAX_ANGLE {
        tracing::warn!(degrees, "actuator angle out of range; clamped to 180");
    }
    u8::try_from(degrees.min(MAX_ANGLE)).unwrap_or(u8::MAX)
}

/// Issue one command, logging (not propagating) driver failures.
pub(crate) fn command(actuator: &mut dyn Actuator, id: ActuatorId, degrees: u8) {
    if let Err(e) = actuator.set_angle(degrees) {
        tracing::warn!(actuator = ?id, degrees, error = %map_hw_error(&*e), "actuator command failed");
    } else {
        tracing::trace!(actuator = ?id, degrees, "actuator command");
    }
}

#[derive(Debug, Clone)]
pub struct ActuationSequencer {
    push: u8,
    eject: u8,
    rest: u8,
    push_hold: Duration,
    transit: Duration,
    eject_hold: Duration,
    pending: VecDeque<Step>,
    wait_until_ms: Option<u64>,
}

impl ActuationSequencer {
    pub fn new(angles: ActuationCfg, timing: &TimingCfg) -> Self {
        Self {
            push: clamp_angle(angles.push_angle),
            eject: clamp_angle(angles.eject_angle),
            rest: clamp_angle(angles.rest_angle),
            push_hold: Duration::from_millis(timing.push_hold_ms),
            transit: Duration::from_millis(timing.transit_ms),
            eject_hold: Duration::from_millis(timing.eject_hold_ms),
            pending: VecDeque::new(),
            wait_until_ms: None,
        }
    }

    pub fn rest_angle(&self) -> u8 {
        self.rest
    }

    /// Steps that route an item with the given classification.
    ///
    /// Every item is pushed off the platform; rejects are additionally
    /// ejected once they have travelled to the ejector.
    pub fn plan(&self, class: Classification) -> Vec<Step> {
        let mut steps = vec![
            Step::Command {
                actuator: ActuatorId::Pusher,
                degrees: self.push,
            },
            Step::Wait(self.push_hold),
            Step::Command {
                actuator: ActuatorId::Pusher,
                degrees: self.rest,
            },
        ];
        if !class.is_accept() {
            steps.extend([
                Step::Wait(self.transit),
                Step::Command {
                    actuator: ActuatorId::Ejector,
                    degrees: self.eject,
                },
                Step::Wait(self.eject_hold),
                Step::Command {
                    actuator: ActuatorId::Ejector,
                    degrees: self.rest,
                },
            ]);
        }
        steps
    }

    /// Load the plan for `class`. Any unfinished plan is discarded.
    pub fn begin(&mut self, class: Classification) {
        if !self.is_idle() {
            tracing::warn!("actuation plan replaced before completion");
        }
        self.pending = self.plan(class).into();
        self.wait_until_ms = None;
    }

    /// True when no plan is loaded or the loaded plan has finished.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.wait_until_ms.is_none()
    }

    /// Advance the plan to `now_ms`. Returns true once every step has run.
    pub fn poll(
        &mut self,
        now_ms: u64,
        pusher: &mut dyn Actuator,
        ejector: &mut dyn Actuator,
    ) -> bool {
        loop {
            if let Some(until) = self.wait_until_ms {
                if now_ms < until {
                    return false;
                }
                self.wait_until_ms = None;
            }
            match self.pending.pop_front() {
                None => return true,
                Some(Step::Command { actuator, degrees }) => match actuator {
                    ActuatorId::Pusher => command(pusher, actuator, degrees),
                    ActuatorId::Ejector => command(ejector, actuator, degrees),
                },
                Some(Step::Wait(d)) => {
                    let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
                    self.wait_until_ms = Some(now_ms.saturating_add(ms));
                }
            }
        }
    }

    /// Run the full plan for `class`, sleeping through `clock` for each wait.
    pub fn run_blocking(
        &mut self,
        class: Classification,
        clock: &dyn Clock,
        pusher: &mut dyn Actuator,
        ejector: &mut dyn Actuator,
    ) {
        self.pending.clear();
        self.wait_until_ms = None;
        for step in self.plan(class) {
            match step {
                Step::Command { actuator, degrees } => match actuator {
                    ActuatorId::Pusher => command(pusher, actuator, degrees),
                    ActuatorId::Ejector => command(ejector, actuator, degrees),
                },
                Step::Wait(d) => clock.sleep(d),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorter_traits::BoxError;

    #[derive(Default)]
    struct Rec(Vec<u8>);
    impl Actuator for Rec {
        fn set_angle(&mut self, degrees: u8) -> Result<(), BoxError> {
            self.0.push(degrees);
            Ok(())
        }
    }

    fn timing() -> TimingCfg {
        TimingCfg {
            settle_ms: 0,
            push_hold_ms: 100,
            transit_ms: 300,
            eject_hold_ms: 50,
            clearance_ms: 0,
        }
    }

    #[test]
    fn accept_plan_leaves_ejector_alone() {
        let seq = ActuationSequencer::new(ActuationCfg::default(), &timing());
        let plan = seq.plan(Classification::Accept);
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|s| !matches!(
            s,
            Step::Command {
                actuator: ActuatorId::Ejector,
                ..
            }
        )));
    }

    #[test]
    fn reject_plan_waits_for_transit_before_eject() {
        let seq = ActuationSequencer::new(ActuationCfg::default(), &timing());
        let plan = seq.plan(Classification::RejectHeavy);
        assert_eq!(
            plan,
            vec![
                Step::Command { actuator: ActuatorId::Pusher, degrees: 180 },
                Step::Wait(Duration::from_millis(100)),
                Step::Command { actuator: ActuatorId::Pusher, degrees: 0 },
                Step::Wait(Duration::from_millis(300)),
                Step::Command { actuator: ActuatorId::Ejector, degrees: 145 },
                Step::Wait(Duration::from_millis(50)),
                Step::Command { actuator: ActuatorId::Ejector, degrees: 0 },
            ]
        );
    }

    #[test]
    fn poll_respects_hold_deadlines() {
        let mut seq = ActuationSequencer::new(ActuationCfg::default(), &timing());
        let (mut a, mut b) = (Rec::default(), Rec::default());
        seq.begin(Classification::RejectLight);

        assert!(!seq.poll(0, &mut a, &mut b));
        assert_eq!(a.0, vec![180]);
        assert!(!seq.poll(99, &mut a, &mut b));
        assert_eq!(a.0, vec![180]);
        assert!(!seq.poll(100, &mut a, &mut b));
        assert_eq!(a.0, vec![180, 0]);
        assert!(b.0.is_empty());
        assert!(!seq.poll(400, &mut a, &mut b));
        assert_eq!(b.0, vec![145]);
        assert!(seq.poll(450, &mut a, &mut b));
        assert_eq!(b.0, vec![145, 0]);
        assert!(seq.is_idle());
    }

    #[test]
    fn out_of_range_angles_are_clamped() {
        let angles = ActuationCfg {
            push_angle: 270,
            eject_angle: 181,
            rest_angle: 0,
        };
        let seq = ActuationSequencer::new(angles, &timing());
        let plan = seq.plan(Classification::RejectLight);
        assert_eq!(
            plan[0],
            Step::Command { actuator: ActuatorId::Pusher, degrees: 180 }
        );
        assert_eq!(
            plan[4],
            Step::Command { actuator: ActuatorId::Ejector, degrees: 180 }
        );
    }
}
