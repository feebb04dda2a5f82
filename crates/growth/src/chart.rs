//! Growth chart overlay data: reference curves plus the patient's measured points.

use crate::percentile::{percentile_of, Indicator, PercentileRow};
use crate::reference::ReferenceTable;
use clinic_types::Sex;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub age_months: u32,
    pub value: f64,
    /// Percentile against the closest-age reference row; `None` without reference data.
    pub percentile: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartOverlay {
    pub indicator: Indicator,
    pub sex: Sex,
    pub unit: String,
    /// Reference rows, one per age, from which the p3..p97 curves are drawn.
    pub curves: Vec<PercentileRow>,
    /// Patient measurements sorted by age.
    pub points: Vec<ChartPoint>,
}

/// Builds the overlay for one indicator from `(age_months, value)` measurements.
pub fn chart_overlay(
    table: &ReferenceTable,
    indicator: Indicator,
    sex: Sex,
    measurements: impl IntoIterator<Item = (u32, f64)>,
) -> ChartOverlay {
    let mut points: Vec<ChartPoint> = measurements
        .into_iter()
        .map(|(age_months, value)| ChartPoint {
            age_months,
            value,
            percentile: table
                .lookup(indicator, sex, age_months)
                .map(|row| percentile_of(value, row)),
        })
        .collect();
    points.sort_by_key(|p| p.age_months);

    ChartOverlay {
        indicator,
        sex,
        unit: indicator.unit().to_string(),
        curves: table.rows(indicator, sex).to_vec(),
        points,
    }
}
