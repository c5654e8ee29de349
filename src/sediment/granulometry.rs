//! Bed-material grain-size descriptors.
//!
//! A granulometry is read once (one JSON file per material) and then shared
//! read-only by every section that references it.
//!
//! ```text
//! {
//!       "dm": 0.05,
//!       "d30": 0.02,
//!       "d50": 0.04,
//!       "d90": 0.15,
//!       "d84tb": 0.09,
//!       "d84bs": 0.2,
//!       "Gr": 2.5
//! }
//! ```
//!
//! Diameters are in metres.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a grain-size record is not physically meaningful.
#[derive(Debug, Error, PartialEq)]
pub enum GranulometryError {
    /// A diameter or the gradation is zero, negative or not finite.
    #[error("granulometry value '{name}' must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// Characteristic diameters of the bed material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Granulometry {
    /// Mean diameter (m)
    pub dm: f64,
    /// 30th percentile diameter (m)
    pub d30: f64,
    /// Median diameter (m)
    pub d50: f64,
    /// 90th percentile diameter (m)
    pub d90: f64,
    /// 84th percentile of the travelling bedload (m)
    pub d84tb: f64,
    /// 84th percentile of the bed surface (m)
    pub d84bs: f64,
    /// Gradation
    #[serde(rename = "Gr")]
    pub gr: f64,
}

impl Granulometry {
    /// Build a validated granulometry.
    pub fn new(
        dm: f64,
        d30: f64,
        d50: f64,
        d90: f64,
        d84tb: f64,
        d84bs: f64,
        gr: f64,
    ) -> Result<Self, GranulometryError> {
        let granulometry = Self {
            dm,
            d30,
            d50,
            d90,
            d84tb,
            d84bs,
            gr,
        };
        granulometry.validate()?;
        Ok(granulometry)
    }

    /// Uniform material: every diameter equal to `d`, gradation 1.
    pub fn uniform(d: f64) -> Result<Self, GranulometryError> {
        Self::new(d, d, d, d, d, d, 1.0)
    }

    /// Check that every value is strictly positive.
    pub fn validate(&self) -> Result<(), GranulometryError> {
        let values = [
            ("dm", self.dm),
            ("d30", self.d30),
            ("d50", self.d50),
            ("d90", self.d90),
            ("d84tb", self.d84tb),
            ("d84bs", self.d84bs),
            ("Gr", self.gr),
        ];
        for (name, value) in values {
            if !(value.is_finite() && value > 0.0) {
                return Err(GranulometryError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    /// Manning coefficient derived from the coarse fraction (Strickler).
    ///
    /// n = d90^{1/6} / 26
    pub fn default_manning(&self) -> f64 {
        self.d90.powf(1.0 / 6.0) / 26.0
    }

    /// Sorting ratio (d90/d30)^0.2 used by the Rickenmann and Lefort formulas.
    pub fn sorting_factor(&self) -> f64 {
        (self.d90 / self.d30).powf(0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_json_keys() {
        let json = r#"{"dm": 0.05, "d30": 0.02, "d50": 0.04, "d90": 0.15,
                       "d84tb": 0.09, "d84bs": 0.2, "Gr": 2.5}"#;
        let g: Granulometry = serde_json::from_str(json).unwrap();
        assert!((g.gr - 2.5).abs() < 1e-14);
        assert!((g.d84bs - 0.2).abs() < 1e-14);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive() {
        let err = Granulometry::new(0.05, 0.0, 0.04, 0.15, 0.09, 0.2, 2.5).unwrap_err();
        assert_eq!(
            err,
            GranulometryError::NonPositive {
                name: "d30",
                value: 0.0
            }
        );
    }

    #[test]
    fn test_default_manning_range() {
        let g = Granulometry::uniform(0.1).unwrap();
        let n = g.default_manning();
        // Gravel-bed rivers sit between 0.02 and 0.05
        assert!(n > 0.02 && n < 0.05, "n = {}", n);
    }
}
