//! Percentile interpolation against WHO reference rows.

use crate::GrowthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The percentiles published in each reference row, lowest first.
pub const BREAKPOINTS: [f64; 5] = [3.0, 15.0, 50.0, 85.0, 97.0];

/// A somatometric indicator with WHO reference data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Weight-for-age, kg.
    Weight,
    /// Length/height-for-age, cm.
    Height,
    /// BMI-for-age, kg/m².
    Bmi,
    /// Head circumference-for-age, cm.
    HeadCircumference,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::Weight,
        Indicator::Height,
        Indicator::Bmi,
        Indicator::HeadCircumference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Weight => "weight",
            Indicator::Height => "height",
            Indicator::Bmi => "bmi",
            Indicator::HeadCircumference => "head_circumference",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Indicator::Weight => "kg",
            Indicator::Height | Indicator::HeadCircumference => "cm",
            Indicator::Bmi => "kg/m²",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weight" => Ok(Indicator::Weight),
            "height" | "length" => Ok(Indicator::Height),
            "bmi" => Ok(Indicator::Bmi),
            "head_circumference" | "head" => Ok(Indicator::HeadCircumference),
            other => Err(GrowthError::InvalidInput(format!(
                "unknown indicator '{other}'"
            ))),
        }
    }
}

/// One WHO reference row: the p3/p15/p50/p85/p97 values for a given age.
///
/// The sex and indicator a row belongs to are carried by the [`ReferenceTable`] series key.
///
/// [`ReferenceTable`]: crate::ReferenceTable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PercentileRow {
    pub age_months: u32,
    pub p3: f64,
    pub p15: f64,
    pub p50: f64,
    pub p85: f64,
    pub p97: f64,
}

impl PercentileRow {
    /// `(percentile, value)` pairs in ascending percentile order.
    pub fn breakpoints(&self) -> [(f64, f64); 5] {
        [
            (BREAKPOINTS[0], self.p3),
            (BREAKPOINTS[1], self.p15),
            (BREAKPOINTS[2], self.p50),
            (BREAKPOINTS[3], self.p85),
            (BREAKPOINTS[4], self.p97),
        ]
    }

    /// Checks the row is usable for interpolation: finite, positive, non-decreasing values.
    pub fn validate(&self) -> Result<(), String> {
        let values = self.breakpoints().map(|(_, v)| v);
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(format!(
                "row for age {} has non-positive or non-finite values",
                self.age_months
            ));
        }
        if values.windows(2).any(|w| w[1] < w[0]) {
            return Err(format!(
                "row for age {} is not ordered p3 <= p15 <= p50 <= p85 <= p97",
                self.age_months
            ));
        }
        Ok(())
    }
}

/// Percentile of `value` within `row`, by linear interpolation between the two bracketing
/// known percentiles.
///
/// Values at or below p3 clamp to 3; values at or above p97 clamp to 97. When adjacent
/// breakpoints share a value, the lowest percentile carrying that value wins.
pub fn percentile_of(value: f64, row: &PercentileRow) -> f64 {
    let points = row.breakpoints();
    let (low_percentile, low_value) = points[0];
    let (high_percentile, high_value) = points[points.len() - 1];

    if value <= low_value {
        return low_percentile;
    }
    if value >= high_value {
        return high_percentile;
    }

    for pair in points.windows(2) {
        let (lo_p, lo_v) = pair[0];
        let (hi_p, hi_v) = pair[1];
        if value <= hi_v {
            let span = hi_v - lo_v;
            if span <= 0.0 {
                return hi_p;
            }
            return lo_p + (value - lo_v) / span * (hi_p - lo_p);
        }
    }

    // Only reachable for NaN input, which fails every comparison above.
    BREAKPOINTS[2]
}

/// Approximate Z-score: `(value - p50) / ((p85 - p15) / 2)`.
///
/// This is not the WHO LMS method. A degenerate row (p85 <= p15) yields 0.
pub fn z_score_approx(value: f64, row: &PercentileRow) -> f64 {
    let spread = (row.p85 - row.p15) / 2.0;
    if spread <= 0.0 {
        return 0.0;
    }
    (value - row.p50) / spread
}
