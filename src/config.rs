//! Effect options and their defaults.
//!
//! Every option struct has a `Default` matching the stock behavior and a
//! `validate` method that rejects values the filters cannot honor.

use crate::error::{FilterError, FilterResult};

/// Default noise decay: perturbation of up to 2.5% of the channel range.
pub const DEFAULT_NOISE_DECAY: f32 = 0.025;

/// Decay used by the aging effect.
pub const AGE_DECAY: f32 = 0.05;

/// Opacity of each offset redraw during a blur pass.
pub const BLUR_OPACITY: f32 = 0.125;

/// Interpolation weight used by `mix` when none is given.
pub const DEFAULT_MIX_WEIGHT: f32 = 0.5;

fn check_decay(decay: f32) -> FilterResult<()> {
    if decay.is_finite() && decay > 0.0 && decay <= 1.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidParameter(format!(
            "decay must be in (0, 1], got {decay}"
        )))
    }
}

/// Reject NaN and infinite saturation multipliers.
pub fn check_multiplier(multiplier: f32) -> FilterResult<()> {
    if multiplier.is_finite() {
        Ok(())
    } else {
        Err(FilterError::InvalidParameter(format!(
            "multiplier must be finite, got {multiplier}"
        )))
    }
}

/// Options for repeated noise passes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NoiseOptions {
    pub passes: u32,
    pub decay: f32,
}

impl Default for NoiseOptions {
    fn default() -> Self {
        NoiseOptions {
            passes: 1,
            decay: DEFAULT_NOISE_DECAY,
        }
    }
}

impl NoiseOptions {
    pub fn new(passes: u32, decay: f32) -> Self {
        NoiseOptions { passes, decay }
    }

    pub fn validate(&self) -> FilterResult<()> {
        check_decay(self.decay)
    }
}

/// Options for the overdraw blur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlurOptions {
    pub passes: u32,
}

impl Default for BlurOptions {
    fn default() -> Self {
        BlurOptions { passes: 1 }
    }
}

impl BlurOptions {
    pub fn new(passes: u32) -> Self {
        BlurOptions { passes }
    }
}

/// Options for color histogram extraction.
///
/// `minimum_count` of `None` or `Some(0)` disables pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistogramOptions {
    pub use_hex: bool,
    pub minimum_count: Option<u32>,
}

impl HistogramOptions {
    /// Key by `#rrggbb`, collapsing alpha variants.
    pub fn hex() -> Self {
        HistogramOptions {
            use_hex: true,
            minimum_count: None,
        }
    }

    pub fn with_minimum_count(mut self, count: u32) -> Self {
        self.minimum_count = Some(count);
        self
    }

    /// Threshold actually applied, if any.
    pub fn threshold(&self) -> Option<u32> {
        self.minimum_count.filter(|&n| n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let noise = NoiseOptions::default();
        assert_eq!(noise.passes, 1);
        assert_eq!(noise.decay, 0.025);
        assert_eq!(BlurOptions::default(), BlurOptions::new(1));
        assert!(!HistogramOptions::default().use_hex);
    }

    #[test]
    fn test_decay_validation() {
        assert!(NoiseOptions::new(1, 0.05).validate().is_ok());
        assert!(NoiseOptions::new(1, 1.0).validate().is_ok());
        assert!(NoiseOptions::new(1, 0.0).validate().is_err());
        assert!(NoiseOptions::new(1, 1.5).validate().is_err());
        assert!(NoiseOptions::new(1, f32::NAN).validate().is_err());
    }

    #[test]
    fn test_histogram_threshold() {
        assert_eq!(HistogramOptions::default().threshold(), None);
        assert_eq!(HistogramOptions::default().with_minimum_count(0).threshold(), None);
        assert_eq!(HistogramOptions::hex().with_minimum_count(3).threshold(), Some(3));
    }

    #[test]
    fn test_multiplier_validation() {
        assert!(check_multiplier(0.0).is_ok());
        assert!(check_multiplier(2.5).is_ok());
        assert!(check_multiplier(f32::INFINITY).is_err());
    }
}
