use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SorterError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("sensor not ready")]
    NotReady,
    #[error("timeout waiting for sensor")]
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("missing weight sensor")]
    MissingSensor,
    #[error("missing pusher actuator")]
    MissingPusher,
    #[error("missing ejector actuator")]
    MissingEjector,
    #[error("missing weight band")]
    MissingBand,
    #[error("invalid weight band: min {min} g must be <= max {max} g and both finite")]
    InvalidBand { min: f32, max: f32 },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
