// Sample validation before anything reaches the store.

use serde::Deserialize;

use crate::error::InvalidDataError;
use crate::models::Sample;

/// Lenient only rejects an absent sample. Strict also range-checks each percentage and the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    mode: ValidationMode,
    sum_tolerance: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::lenient()
    }
}

impl Validator {
    pub const DEFAULT_SUM_TOLERANCE: f64 = 1.0;

    pub fn new(mode: ValidationMode, sum_tolerance: f64) -> Self {
        Self {
            mode,
            sum_tolerance,
        }
    }

    pub fn lenient() -> Self {
        Self::new(ValidationMode::Lenient, Self::DEFAULT_SUM_TOLERANCE)
    }

    pub fn strict(sum_tolerance: f64) -> Self {
        Self::new(ValidationMode::Strict, sum_tolerance)
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn validate(&self, sample: Option<&Sample>) -> Result<(), InvalidDataError> {
        let Some(sample) = sample else {
            return Err(InvalidDataError::Absent);
        };
        if self.mode == ValidationMode::Lenient {
            return Ok(());
        }

        let fields = [
            ("userUsage", sample.user_usage),
            ("systemUsage", sample.system_usage),
            ("idleUsage", sample.idle_usage),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(InvalidDataError::NotFinite { field });
            }
            if !(0.0..=100.0).contains(&value) {
                return Err(InvalidDataError::OutOfRange { field, value });
            }
        }

        let sum = sample.reading().total();
        if (sum - 100.0).abs() > self.sum_tolerance {
            return Err(InvalidDataError::SumOutOfTolerance {
                sum,
                tolerance: self.sum_tolerance,
            });
        }
        Ok(())
    }
}
