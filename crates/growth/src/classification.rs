//! Fixed-threshold nutritional and growth status classification.

use crate::percentile::Indicator;
use serde::{Deserialize, Serialize};

/// BMI percentile below which a child is classed as underweight.
pub const BMI_UNDERWEIGHT_BELOW: f64 = 15.0;
/// BMI percentile at or above which a child is classed as overweight.
pub const BMI_OVERWEIGHT_FROM: f64 = 85.0;
/// BMI percentile at or above which a child is classed as obese.
pub const BMI_OBESITY_FROM: f64 = 97.0;

/// Percentile at or below which weight/height/head circumference is flagged as low.
///
/// Percentiles are clamped to [3, 97] by interpolation, so the extreme bands are inclusive.
pub const EXTREME_LOW_AT_OR_BELOW: f64 = 3.0;
/// Percentile below which weight/height is flagged as at risk of being low.
pub const RISK_LOW_BELOW: f64 = 15.0;
/// Percentile at or above which weight is flagged as at risk of being high.
pub const RISK_HIGH_FROM: f64 = 85.0;
/// Percentile at or above which weight/height/head circumference is flagged as high.
pub const EXTREME_HIGH_FROM: f64 = 97.0;

pub const HYPOTHERMIA_BELOW_C: f64 = 35.0;
pub const LOW_GRADE_FEVER_FROM_C: f64 = 37.5;
pub const FEVER_FROM_C: f64 = 38.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    // BMI-for-age
    Underweight,
    Overweight,
    Obesity,
    // Weight-for-age
    LowWeight,
    RiskOfLowWeight,
    RiskOfHighWeight,
    HighWeight,
    // Height-for-age
    ShortStature,
    RiskOfShortStature,
    Tall,
    // Head circumference-for-age
    Microcephaly,
    Macrocephaly,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Normal => "Normal",
            Classification::Underweight => "Underweight",
            Classification::Overweight => "Overweight",
            Classification::Obesity => "Obesity",
            Classification::LowWeight => "Low weight",
            Classification::RiskOfLowWeight => "Risk of low weight",
            Classification::RiskOfHighWeight => "Risk of high weight",
            Classification::HighWeight => "High weight",
            Classification::ShortStature => "Short stature",
            Classification::RiskOfShortStature => "Risk of short stature",
            Classification::Tall => "Tall stature",
            Classification::Microcephaly => "Microcephaly",
            Classification::Macrocephaly => "Macrocephaly",
        }
    }

    /// Whether the classification should be flagged for clinical attention.
    pub fn is_alert(&self) -> bool {
        !matches!(self, Classification::Normal)
    }
}

/// Classifies a percentile for the given indicator.
pub fn classify(indicator: Indicator, percentile: f64) -> Classification {
    match indicator {
        Indicator::Bmi => {
            if percentile >= BMI_OBESITY_FROM {
                Classification::Obesity
            } else if percentile >= BMI_OVERWEIGHT_FROM {
                Classification::Overweight
            } else if percentile < BMI_UNDERWEIGHT_BELOW {
                Classification::Underweight
            } else {
                Classification::Normal
            }
        }
        Indicator::Weight => {
            if percentile <= EXTREME_LOW_AT_OR_BELOW {
                Classification::LowWeight
            } else if percentile < RISK_LOW_BELOW {
                Classification::RiskOfLowWeight
            } else if percentile >= EXTREME_HIGH_FROM {
                Classification::HighWeight
            } else if percentile >= RISK_HIGH_FROM {
                Classification::RiskOfHighWeight
            } else {
                Classification::Normal
            }
        }
        Indicator::Height => {
            if percentile <= EXTREME_LOW_AT_OR_BELOW {
                Classification::ShortStature
            } else if percentile < RISK_LOW_BELOW {
                Classification::RiskOfShortStature
            } else if percentile >= EXTREME_HIGH_FROM {
                Classification::Tall
            } else {
                Classification::Normal
            }
        }
        Indicator::HeadCircumference => {
            if percentile <= EXTREME_LOW_AT_OR_BELOW {
                Classification::Microcephaly
            } else if percentile >= EXTREME_HIGH_FROM {
                Classification::Macrocephaly
            } else {
                Classification::Normal
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureStatus {
    Hypothermia,
    Normal,
    LowGradeFever,
    Fever,
}

impl TemperatureStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TemperatureStatus::Hypothermia => "Hypothermia",
            TemperatureStatus::Normal => "Normal",
            TemperatureStatus::LowGradeFever => "Low-grade fever",
            TemperatureStatus::Fever => "Fever",
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, TemperatureStatus::Normal)
    }
}

/// Classifies a body temperature in degrees Celsius.
pub fn classify_temperature(celsius: f64) -> TemperatureStatus {
    if celsius < HYPOTHERMIA_BELOW_C {
        TemperatureStatus::Hypothermia
    } else if celsius >= FEVER_FROM_C {
        TemperatureStatus::Fever
    } else if celsius >= LOW_GRADE_FEVER_FROM_C {
        TemperatureStatus::LowGradeFever
    } else {
        TemperatureStatus::Normal
    }
}
