//! Per-measurement growth assessment.

use crate::bmi::{bmi, round_to};
use crate::classification::{classify, classify_temperature, Classification, TemperatureStatus};
use crate::percentile::{percentile_of, z_score_approx, Indicator};
use crate::reference::ReferenceTable;
use clinic_types::Sex;
use serde::{Deserialize, Serialize};

/// One set of measurements taken at a given age.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub age_months: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub head_circumference_cm: Option<f64>,
    pub temperature_c: Option<f64>,
}

impl Measurement {
    /// The measured value for `indicator`, BMI being derived from weight and height.
    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Weight => Some(self.weight_kg),
            Indicator::Height => Some(self.height_cm),
            Indicator::Bmi => bmi(self.weight_kg, self.height_cm),
            Indicator::HeadCircumference => self.head_circumference_cm,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorAssessment {
    pub indicator: Indicator,
    pub value: f64,
    /// Percentile rounded to one decimal.
    pub percentile: f64,
    /// Approximate Z-score rounded to two decimals.
    pub z_score: f64,
    pub classification: Classification,
    /// Age of the reference row the value was compared against.
    pub reference_age_months: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssessment {
    pub age_months: u32,
    pub bmi: Option<f64>,
    /// One entry per indicator that has both a value and reference data.
    pub indicators: Vec<IndicatorAssessment>,
    pub temperature: Option<TemperatureStatus>,
}

impl GrowthAssessment {
    /// Assesses every indicator of `measurement` against `table`.
    ///
    /// Indicators without a measured value or without reference data are omitted rather than
    /// reported as errors.
    pub fn assess(table: &ReferenceTable, sex: Sex, measurement: &Measurement) -> Self {
        let indicators = Indicator::ALL
            .iter()
            .filter_map(|&indicator| {
                let value = measurement.value(indicator)?;
                let row = table.lookup(indicator, sex, measurement.age_months)?;
                let percentile = percentile_of(value, row);
                Some(IndicatorAssessment {
                    indicator,
                    value: round_to(value, 2),
                    percentile: round_to(percentile, 1),
                    z_score: round_to(z_score_approx(value, row), 2),
                    classification: classify(indicator, percentile),
                    reference_age_months: row.age_months,
                })
            })
            .collect();

        Self {
            age_months: measurement.age_months,
            bmi: bmi(measurement.weight_kg, measurement.height_cm).map(|b| round_to(b, 2)),
            indicators,
            temperature: measurement.temperature_c.map(classify_temperature),
        }
    }

    pub fn get(&self, indicator: Indicator) -> Option<&IndicatorAssessment> {
        self.indicators.iter().find(|a| a.indicator == indicator)
    }

    /// Indicators whose classification needs clinical attention.
    pub fn alerts(&self) -> impl Iterator<Item = &IndicatorAssessment> {
        self.indicators
            .iter()
            .filter(|a| a.classification.is_alert())
    }
}
