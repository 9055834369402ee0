//! Collaborator implementations for the sorting line.
//!
//! Only the simulated line ships here; board drivers plug in through the
//! `sorter_traits` traits.
pub mod error;
pub mod sim;

pub use sim::{SimActuator, SimCfg, SimLine, SimPresence, SimSensor};
