use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("load cell not ready")]
    NotReady,
    #[error("invalid calibration factor: {0}")]
    Calibration(f32),
}
