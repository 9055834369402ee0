//! Collaborator traits for the sorting line.
//!
//! Drivers for the load cell, the two routing actuators, the status display
//! and the downstream presence sensor live behind these traits so the control
//! loop stays hardware-agnostic.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type returned across the trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Calibrated load cell.
pub trait WeightSensor {
    /// Read the calibrated weight in grams, averaged by the driver over `samples` conversions.
    fn read(&mut self, samples: u8) -> Result<f32, BoxError>;
    /// True once the converter has settled and data is available.
    fn is_ready(&mut self) -> bool;
    /// Zero the scale at the current load.
    fn tare(&mut self) -> Result<(), BoxError>;
    /// Replace the counts-to-grams calibration factor.
    fn set_calibration(&mut self, factor: f32) -> Result<(), BoxError>;
}

/// Positional actuator commanded in degrees (servo style, 0..=180).
pub trait Actuator {
    fn set_angle(&mut self, degrees: u8) -> Result<(), BoxError>;
}

/// Character display used for local status.
pub trait Display {
    fn show_weight(&mut self, grams: f32) -> Result<(), BoxError>;
    fn show_text(&mut self, text: &str, col: u8, row: u8) -> Result<(), BoxError>;
    fn clear(&mut self) -> Result<(), BoxError>;
}

/// Binary presence input at the end of the belt.
pub trait PresenceSensor {
    /// Current digital level; `true` is HIGH.
    fn is_high(&mut self) -> Result<bool, BoxError>;
}
