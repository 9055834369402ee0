//! Stand-in collaborators for lines without a display or exit sensor.

use sorter_traits::BoxError;

/// Display that discards everything.
pub struct NullDisplay;

impl sorter_traits::Display for NullDisplay {
    fn show_weight(&mut self, _grams: f32) -> Result<(), BoxError> {
        Ok(())
    }
    fn show_text(&mut self, _text: &str, _col: u8, _row: u8) -> Result<(), BoxError> {
        Ok(())
    }
    fn clear(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Exit sensor that always reads HIGH (beam clear); never confirms a transit.
pub struct NoPresence;

impl sorter_traits::PresenceSensor for NoPresence {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Ok(true)
    }
}
