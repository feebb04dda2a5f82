//! Input slider bounds for measurement forms.

use crate::bmi::round_to;
use crate::percentile::{Indicator, PercentileRow};
use serde::{Deserialize, Serialize};

/// Lower bound as a fraction of p3 when reference data is available.
const LOWER_FACTOR: f64 = 0.8;
/// Upper bound as a multiple of p97 when reference data is available.
const UPPER_FACTOR: f64 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliderBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// True when no reference row was available and the neutral fallback range was used.
    pub fallback: bool,
}

/// Temperature input range in °C. Temperature has no age-dependent reference data.
pub const TEMPERATURE_BOUNDS: SliderBounds = SliderBounds {
    min: 34.0,
    max: 42.0,
    step: 0.1,
    fallback: false,
};

fn neutral_range(indicator: Indicator) -> SliderBounds {
    let (min, max, step) = match indicator {
        Indicator::Weight => (0.5, 150.0, 0.1),
        Indicator::Height => (30.0, 200.0, 0.5),
        Indicator::Bmi => (8.0, 45.0, 0.1),
        Indicator::HeadCircumference => (25.0, 60.0, 0.1),
    };
    SliderBounds {
        min,
        max,
        step,
        fallback: true,
    }
}

/// Slider range for an indicator.
///
/// With a reference row the range is `[p3 * 0.8, p97 * 1.2]` rounded to one decimal. Without
/// one (missing reference data) a fixed neutral range is returned so the form still works.
pub fn slider_bounds(indicator: Indicator, row: Option<&PercentileRow>) -> SliderBounds {
    let neutral = neutral_range(indicator);
    match row {
        Some(row) => SliderBounds {
            min: round_to(row.p3 * LOWER_FACTOR, 1),
            max: round_to(row.p97 * UPPER_FACTOR, 1),
            step: neutral.step,
            fallback: false,
        },
        None => neutral,
    }
}
