//! Pediatric growth (somatometry) calculations.
//!
//! This crate is pure computation with no storage or API concerns:
//! - age in whole months between a birth date and a measurement date
//! - body mass index from weight and height
//! - piecewise-linear percentile interpolation against WHO reference rows
//! - an approximate Z-score derived from the p15/p50/p85 spread
//! - fixed-threshold classification of percentiles and temperatures
//! - WHO reference tables (bundled, or loaded from YAML) with age lookup
//! - slider bounds and chart overlay data for measurement forms
//!
//! The Z-score here is **not** the WHO LMS method. It is a linear approximation
//! `(value - p50) / ((p85 - p15) / 2)` and is kept that way so results match what clinicians
//! already see on existing charts.

pub mod age;
pub mod assessment;
pub mod bmi;
pub mod bounds;
pub mod chart;
pub mod classification;
pub mod percentile;
pub mod reference;

pub use age::age_in_months;
pub use assessment::{GrowthAssessment, IndicatorAssessment, Measurement};
pub use bmi::{bmi, round_to};
pub use bounds::{slider_bounds, SliderBounds, TEMPERATURE_BOUNDS};
pub use chart::{chart_overlay, ChartOverlay, ChartPoint};
pub use classification::{classify, classify_temperature, Classification, TemperatureStatus};
pub use percentile::{percentile_of, z_score_approx, Indicator, PercentileRow, BREAKPOINTS};
pub use reference::ReferenceTable;

pub use clinic_types::Sex;

/// Errors returned by the `growth` crate.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("reference table error: {0}")]
    Reference(String),
}

/// Type alias for Results that can fail with a [`GrowthError`].
pub type GrowthResult<T> = Result<T, GrowthError>;
