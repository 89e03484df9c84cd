//! Piecewise-constant maps from age to a value.
//!
//! Used for age-dependent condition parameters such as case-fatality
//! probabilities and at-risk fractions. An [`AgeMap`] is a sorted list
//! of `(upper_age, value)` bands: a lookup walks the bands in order and
//! returns the value of the first band whose upper bound is at or above
//! the queried age. Ages past the last band get the last band's value.

use epi_core::{EpiError, EpiResult};

/// Age bands mapping `age <= upper` to a value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgeMap {
    bands: Vec<(f64, f64)>,
}

impl AgeMap {
    /// Builds a map from `(upper_age, value)` bands.
    ///
    /// Bands must be non-empty and strictly increasing in age.
    pub fn new(bands: Vec<(f64, f64)>) -> EpiResult<Self> {
        if bands.is_empty() {
            return Err(EpiError::Config("age map needs at least one band".into()));
        }
        for pair in bands.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(EpiError::Config(format!(
                    "age map bands out of order: {} then {}",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(Self { bands })
    }

    /// A map returning the same value for every age.
    pub fn constant(value: f64) -> Self {
        Self { bands: vec![(f64::MAX, value)] }
    }

    /// Value for `age`; ages beyond the last band use the last band.
    pub fn find_value(&self, age: f64) -> f64 {
        for &(upper, value) in &self.bands {
            if age <= upper {
                return value;
            }
        }
        self.bands[self.bands.len() - 1].1
    }

    pub fn bands(&self) -> &[(f64, f64)] {
        &self.bands
    }
}
