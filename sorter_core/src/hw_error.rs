//! Maps `Box<dyn Error>` from trait boundaries to typed `SorterError`.
//!
//! The traits in `sorter_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `sorter_hardware::HwError` downcasting.

use crate::error::SorterError;

/// Map a trait-boundary error to a typed `SorterError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SorterError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sorter_hardware::error::HwError>() {
            return match hw {
                sorter_hardware::error::HwError::NotReady => SorterError::NotReady,
                other => SorterError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("not ready") {
        SorterError::NotReady
    } else if lower.contains("timeout") {
        SorterError::Timeout
    } else {
        SorterError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_fallback_detects_timeout() {
        let e = std::io::Error::other("hx711 data-ready timeout");
        assert!(matches!(map_hw_error(&e), SorterError::Timeout));
    }

    #[test]
    fn unknown_errors_keep_message() {
        let e = std::io::Error::other("bus fault");
        match map_hw_error(&e) {
            SorterError::Hardware(msg) => assert_eq!(msg, "bus fault"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_typed_hw_error() {
        let e = sorter_hardware::error::HwError::NotReady;
        assert!(matches!(map_hw_error(&e), SorterError::NotReady));
        let e = sorter_hardware::error::HwError::Gpio("pin 8".into());
        assert!(matches!(map_hw_error(&e), SorterError::HardwareFault(_)));
    }
}
