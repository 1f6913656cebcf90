//! Clamping of controller actuation into an allowed range

use serde::{Deserialize, Serialize};

use crate::warning::Warning;

/// Clamp values into `[min, max]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RangeLimiter {
    min: f64,
    max: f64,
}

impl Default for RangeLimiter {
    /// Unbounded; never clips a finite value
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

impl RangeLimiter {
    pub fn new(min: f64, max: f64) -> Result<Self, Warning> {
        if min.is_nan() || max.is_nan() {
            return Err(Warning::new("Actuation limits must not be NaN"));
        }
        if min > max {
            return Err(Warning::new(format!(
                "Lower actuation limit {min} is above upper limit {max}"
            )));
        }

        Ok(Self { min, max })
    }

    /// Clamp `value` into the range. NaN input yields the lower limit.
    #[inline]
    pub fn limit(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
