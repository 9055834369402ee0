//! Accept/reject decision against an inclusive weight band.

use crate::error::BuildError;

/// Inclusive acceptance range in grams. Construct through `WeightBand::new`,
/// which rejects inverted or non-finite bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBand {
    min_g: f32,
    max_g: f32,
}

impl WeightBand {
    pub fn new(min_g: f32, max_g: f32) -> Result<Self, BuildError> {
        if !min_g.is_finite() || !max_g.is_finite() || min_g > max_g {
            return Err(BuildError::InvalidBand {
                min: min_g,
                max: max_g,
            });
        }
        Ok(Self { min_g, max_g })
    }

    pub fn min_g(&self) -> f32 {
        self.min_g
    }

    pub fn max_g(&self) -> f32 {
        self.max_g
    }

    pub fn contains(&self, weight_g: f32) -> bool {
        classify(weight_g, self).is_accept()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Accept,
    RejectLight,
    RejectHeavy,
}

impl Classification {
    pub fn is_accept(self) -> bool {
        matches!(self, Classification::Accept)
    }

    /// Short label for a 16-column display.
    pub fn short_label(self) -> &'static str {
        match self {
            Classification::Accept => "PASS",
            Classification::RejectLight => "REJ LIGHT",
            Classification::RejectHeavy => "REJ HEAVY",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Classification::Accept => "ACCEPT",
            Classification::RejectLight => "REJECT_LIGHT",
            Classification::RejectHeavy => "REJECT_HEAVY",
        })
    }
}

/// Classify `weight_g` against `band`. Both bounds are accepts; NaN is light.
#[inline]
pub fn classify(weight_g: f32, band: &WeightBand) -> Classification {
    if weight_g.is_nan() || weight_g < band.min_g {
        Classification::RejectLight
    } else if weight_g > band.max_g {
        Classification::RejectHeavy
    } else {
        Classification::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_inclusive() {
        let band = WeightBand::new(50.0, 200.0).unwrap();
        assert_eq!(classify(49.9, &band), Classification::RejectLight);
        assert_eq!(classify(50.0, &band), Classification::Accept);
        assert_eq!(classify(200.0, &band), Classification::Accept);
        assert_eq!(classify(200.1, &band), Classification::RejectHeavy);
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        let band = WeightBand::new(50.0, 200.0).unwrap();
        assert_eq!(classify(f32::NAN, &band), Classification::RejectLight);
        assert_eq!(classify(f32::NEG_INFINITY, &band), Classification::RejectLight);
        assert_eq!(classify(f32::INFINITY, &band), Classification::RejectHeavy);
    }

    #[test]
    fn inverted_band_is_rejected_not_swapped() {
        let err = WeightBand::new(200.0, 50.0).unwrap_err();
        assert_eq!(
            err,
            BuildError::InvalidBand {
                min: 200.0,
                max: 50.0
            }
        );
    }
}
